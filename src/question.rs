use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::options::{ADDITION_BIAS, DISTRACTOR_SPREAD};
use crate::types::{Operator, Question, Tier};

/// Produces single-digit style addition and subtraction problems whose
/// answers and options stay within `0..=max`.
#[derive(Debug, Clone, Copy)]
pub struct QuestionGenerator {
    max: u32,
    addition_bias: f64,
}

impl Default for QuestionGenerator {
    fn default() -> Self {
        Self::new(Tier::default(), ADDITION_BIAS)
    }
}

impl QuestionGenerator {
    pub fn new(tier: Tier, addition_bias: f64) -> Self {
        Self {
            max: tier.max(),
            addition_bias: addition_bias.clamp(0.0, 1.0),
        }
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn generate(&self, rng: &mut impl Rng) -> Question {
        let operator = if rng.gen_bool(self.addition_bias) {
            Operator::Add
        } else {
            Operator::Subtract
        };

        let (num1, num2, answer) = match operator {
            Operator::Add => {
                let num1 = rng.gen_range(1..self.max);
                let num2 = rng.gen_range(1..=self.max - num1);
                (num1, num2, num1 + num2)
            }
            Operator::Subtract => {
                let num1 = rng.gen_range(2..self.max);
                let num2 = rng.gen_range(1..num1);
                (num1, num2, num1 - num2)
            }
        };

        let options = self.options_for(answer, rng);

        debug!(
            num1 = num1,
            num2 = num2,
            operator = %operator,
            answer = answer,
            ?options,
            "Generated question"
        );

        Question { num1, num2, operator, answer, options }
    }

    /// Up-front sequence for a timed run. Each entry is sampled independently.
    pub fn generate_set(&self, count: usize, rng: &mut impl Rng) -> Vec<Question> {
        (0..count).map(|_| self.generate(rng)).collect()
    }

    fn options_for(&self, answer: u32, rng: &mut impl Rng) -> [u32; 4] {
        let mut options = vec![answer];

        while options.len() < 4 {
            let offset = rng.gen_range(-DISTRACTOR_SPREAD..=DISTRACTOR_SPREAD);
            let candidate = answer as i64 + offset;
            if offset == 0 || candidate < 0 || candidate > self.max as i64 {
                continue;
            }
            let candidate = candidate as u32;
            if !options.contains(&candidate) {
                options.push(candidate);
            }
        }

        options.shuffle(rng);
        [options[0], options[1], options[2], options[3]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn check_invariants(q: &Question, max: u32) {
        assert_eq!(q.operator.apply(q.num1, q.num2), Some(q.answer));
        assert!(q.answer <= max, "answer {} exceeds {}", q.answer, max);
        assert!(q.options.contains(&q.answer));
        for (i, a) in q.options.iter().enumerate() {
            assert!(*a <= max);
            for b in &q.options[i + 1..] {
                assert_ne!(a, b, "duplicate option in {:?}", q.options);
            }
        }
        match q.operator {
            Operator::Add => assert!(q.num2 >= 1),
            Operator::Subtract => assert!(q.num1 > q.num2 && q.num2 >= 1),
        }
    }

    #[test]
    fn test_generated_questions_hold_invariants() {
        let mut rng = StdRng::seed_from_u64(42);
        for tier in [Tier::UpToTen, Tier::UpToTwenty] {
            let generator = QuestionGenerator::new(tier, ADDITION_BIAS);
            for _ in 0..2000 {
                let q = generator.generate(&mut rng);
                check_invariants(&q, tier.max());
            }
        }
    }

    #[test]
    fn test_bias_extremes() {
        let mut rng = StdRng::seed_from_u64(7);
        let only_add = QuestionGenerator::new(Tier::UpToTen, 1.0);
        let only_sub = QuestionGenerator::new(Tier::UpToTen, 0.0);
        for _ in 0..200 {
            assert_eq!(only_add.generate(&mut rng).operator, Operator::Add);
            assert_eq!(only_sub.generate(&mut rng).operator, Operator::Subtract);
        }
    }

    #[test]
    fn test_options_at_range_edges() {
        let mut rng = StdRng::seed_from_u64(3);
        let generator = QuestionGenerator::new(Tier::UpToTen, ADDITION_BIAS);
        for answer in [0, 1, 9, 10] {
            for _ in 0..50 {
                let options = generator.options_for(answer, &mut rng);
                assert!(options.contains(&answer));
                assert!(options.iter().all(|o| *o <= 10));
            }
        }
    }

    #[test]
    fn test_option_order_varies() {
        let mut rng = StdRng::seed_from_u64(11);
        let generator = QuestionGenerator::default();
        let positions: std::collections::HashSet<usize> = (0..100)
            .map(|_| {
                let options = generator.options_for(5, &mut rng);
                options.iter().position(|o| *o == 5).unwrap()
            })
            .collect();
        assert_eq!(positions.len(), 4);
    }

    #[test]
    fn test_generate_set_length() {
        let mut rng = StdRng::seed_from_u64(99);
        let set = QuestionGenerator::default().generate_set(10, &mut rng);
        assert_eq!(set.len(), 10);
        for q in &set {
            check_invariants(q, 10);
        }
        assert!(QuestionGenerator::default().generate_set(0, &mut rng).is_empty());
    }
}
