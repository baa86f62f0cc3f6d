// Cosmetic catalogue. Order matters: hats and accessories unlock front to back.
pub static COLORS: [&str; 6] = [
    "#3b82f6", "#ef4444", "#22c55e", "#f97316", "#a855f7", "#ec4899",
];

pub static HATS: [&str; 5] = ["none", "Top Hat", "Party Hat", "Crown", "Beanie"];

pub static ACCESSORIES: [&str; 4] = ["none", "Glasses", "Bowtie", "Scarf"];

pub const DEFAULT_COLOR: &str = "#3b82f6";
pub const DEFAULT_HAT: &str = "none";
pub const DEFAULT_ACCESSORY: &str = "none";

pub const QUESTIONS_PER_STAGE: u32 = 20;
pub const RUN_LENGTH: usize = 10;

/// Share of generated questions that are additions.
pub const ADDITION_BIAS: f64 = 0.6;

// Largest perturbation applied to the answer when building distractors.
// With a spread of 3 every answer in 0..=max has at least three in-range neighbours.
pub const DISTRACTOR_SPREAD: i64 = 3;

pub const STAGE_CORRECT_DELAY_MS: u64 = 1000;
pub const STAGE_INCORRECT_DELAY_MS: u64 = 500;
pub const TIMED_CORRECT_DELAY_MS: u64 = 1200;
pub const TIMED_INCORRECT_DELAY_MS: u64 = 800;
