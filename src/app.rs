use chrono::{Datelike, Utc};
use ratatui::layout::Alignment;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};
use tracing::debug;

use math_monster::calendar::{next_month, previous_month};
use math_monster::storage::FileStore;
use math_monster::types::format_time;
use math_monster::{AnswerOutcome, Customization, GameEngine, GameMode, GameStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Game,
    Calendar { year: i32, month: u32 },
}

pub struct App {
    pub engine: GameEngine<FileStore>,
    pub view: View,
    pub should_quit: bool,
}

impl App {
    pub fn new(engine: GameEngine<FileStore>) -> Self {
        Self {
            engine,
            view: View::Game,
            should_quit: false,
        }
    }

    /// Keys 1-4 pick the matching choice.
    pub fn handle_choice(&mut self, slot: usize) -> Option<AnswerOutcome> {
        let value = *self.engine.choices()?.get(slot)?;
        let outcome = self.engine.submit_answer(value);
        debug!(slot = slot, value = value, ?outcome, "Choice submitted");
        Some(outcome)
    }

    pub fn handle_enter(&mut self) {
        match (self.engine.mode(), self.engine.status()) {
            (GameMode::Stage, GameStatus::StageCleared) => {
                self.engine.start_next_stage();
            }
            (GameMode::Timed, GameStatus::Start | GameStatus::Finished) => {
                self.engine.play_again();
            }
            _ => {}
        }
    }

    pub fn toggle_calendar(&mut self) {
        self.view = match self.view {
            View::Game => {
                let today = Utc::now().date_naive();
                View::Calendar { year: today.year(), month: today.month() }
            }
            View::Calendar { .. } => View::Game,
        };
    }

    pub fn shift_month(&mut self, forward: bool) {
        if let View::Calendar { year, month } = self.view {
            let (year, month) = if forward {
                next_month(year, month)
            } else {
                previous_month(year, month)
            };
            self.view = View::Calendar { year, month };
        }
    }

    /// Cycles one cosmetic slot through its unlocked options. Only offered
    /// on the stage-cleared screen.
    pub fn cycle_cosmetic(&mut self, slot: char) {
        if self.engine.status() != GameStatus::StageCleared {
            return;
        }
        let characters = self.engine.characters();
        let character = characters.character();
        let (choices, current) = match slot {
            'c' => (characters.unlocked_colors(), character.color.as_str()),
            'h' => (characters.unlocked_hats(), character.hat.as_str()),
            'a' => (characters.unlocked_accessories(), character.accessory.as_str()),
            _ => return,
        };
        let next = match choices.iter().position(|c| *c == current) {
            Some(i) => choices[(i + 1) % choices.len()],
            None => choices[0],
        };
        let customization = match slot {
            'c' => Customization::color(next),
            'h' => Customization::hat(next),
            _ => Customization::accessory(next),
        };
        self.engine.apply_customization(customization);
    }

    pub fn render(&self, f: &mut Frame) {
        let area = f.area();
        if let View::Calendar { year, month } = self.view {
            self.render_calendar(f, area, year, month);
            return;
        }

        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),       // Progress and clock
                Constraint::Percentage(30),  // Character
                Constraint::Percentage(30),  // Question
                Constraint::Min(5),          // Choices or results
                Constraint::Length(3),       // Help
            ])
            .split(area);

        self.render_progress(f, main_chunks[0]);
        self.render_character(f, main_chunks[1]);
        match self.engine.status() {
            GameStatus::StageCleared => self.render_stage_cleared(f, main_chunks[2]),
            GameStatus::Finished => self.render_results(f, main_chunks[2]),
            GameStatus::Start => self.render_banner(f, main_chunks[2], "Press Enter to start"),
            GameStatus::Playing | GameStatus::CorrectFeedback => self.render_question(f, main_chunks[2]),
        }
        if matches!(self.engine.status(), GameStatus::Playing | GameStatus::CorrectFeedback) {
            self.render_choices(f, main_chunks[3]);
        }
        self.render_help(f, main_chunks[4]);
    }

    fn render_progress(&self, f: &mut Frame, area: Rect) {
        let total = self.engine.total_questions().max(1);
        let current = self.engine.question_number().min(total);
        let label = format!(
            "Question {}/{}  {}",
            current,
            total,
            format_time(Some(self.engine.elapsed_ms()))
        );
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL))
            .gauge_style(Style::default().fg(Color::Yellow))
            .ratio(current as f64 / total as f64)
            .label(label);
        f.render_widget(gauge, area);
    }

    fn render_character(&self, f: &mut Frame, area: Rect) {
        let character = self.engine.character();
        let color = hex_to_color(&character.color);
        let face = if self.engine.status() == GameStatus::Playing { "( o_o )" } else { "( ^o^ )" };

        let mut lines = Vec::new();
        if character.hat != "none" {
            lines.push(Line::from(Span::raw(format!("[{}]", character.hat))));
        }
        lines.push(Line::from(Span::styled(face, Style::default().fg(color).add_modifier(Modifier::BOLD))));
        if character.accessory != "none" {
            lines.push(Line::from(Span::raw(format!("~ {} ~", character.accessory))));
        }
        lines.push(Line::from(Span::raw(format!(
            "Stages cleared: {}",
            character.stages_cleared
        ))));

        let block = Block::default().title("Monster").borders(Borders::ALL);
        f.render_widget(
            Paragraph::new(lines).block(block).alignment(Alignment::Center),
            area,
        );
    }

    fn render_question(&self, f: &mut Frame, area: Rect) {
        let text = self.engine.question().map(|q| q.text()).unwrap_or_default();
        let mut lines = vec![Line::from(Span::styled(
            text,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))];
        if self.engine.status() == GameStatus::CorrectFeedback {
            lines.push(Line::from(Span::styled("Correct!", Style::default().fg(Color::Green))));
        } else if self.engine.incorrect_guess().is_some() {
            lines.push(Line::from(Span::styled("So close! Try again!", Style::default().fg(Color::Yellow))));
        }

        let block = Block::default().title("Question").borders(Borders::ALL);
        f.render_widget(
            Paragraph::new(lines).block(block).alignment(Alignment::Center),
            area,
        );
    }

    fn render_choices(&self, f: &mut Frame, area: Rect) {
        let Some(choices) = self.engine.choices() else {
            return;
        };
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(25); 4])
            .split(area);

        let answer = self.engine.question().map(|q| q.answer);
        for (i, choice) in choices.iter().enumerate() {
            let style = if self.engine.incorrect_guess() == Some(*choice) {
                Style::default().fg(Color::Red)
            } else if self.engine.status() == GameStatus::CorrectFeedback && answer == Some(*choice) {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            };
            let paragraph = Paragraph::new(Line::from(Span::styled(choice.to_string(), style)))
                .block(Block::default().title(format!("{}", i + 1)).borders(Borders::ALL))
                .alignment(Alignment::Center);
            f.render_widget(paragraph, chunks[i]);
        }
    }

    fn render_stage_cleared(&self, f: &mut Frame, area: Rect) {
        let characters = self.engine.characters();
        let lines = vec![
            Line::from(Span::styled("Stage clear!", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))),
            Line::from(format!("Colors: {}", characters.unlocked_colors().join(" "))),
            Line::from(format!("Hats: {}", characters.unlocked_hats().join(", "))),
            Line::from(format!("Accessories: {}", characters.unlocked_accessories().join(", "))),
        ];
        let block = Block::default().title("Dress up").borders(Borders::ALL);
        f.render_widget(Paragraph::new(lines).block(block).alignment(Alignment::Center), area);
    }

    fn render_results(&self, f: &mut Frame, area: Rect) {
        let Some(result) = self.engine.last_result() else {
            return;
        };
        let mut lines = vec![Line::from(Span::styled(
            "Clear!",
            Style::default().add_modifier(Modifier::BOLD),
        ))];
        if result.is_new_best {
            lines.push(Line::from(Span::styled("New best time!", Style::default().fg(Color::Yellow))));
        }
        lines.push(Line::from(format!("Previous: {}", format_time(result.previous_time))));
        lines.push(Line::from(format!("This run: {}", format_time(Some(result.current_time)))));
        lines.push(Line::from(format!("Best:     {}", format_time(result.best_time))));

        let block = Block::default().title("Results").borders(Borders::ALL);
        f.render_widget(Paragraph::new(lines).block(block).alignment(Alignment::Center), area);
    }

    fn render_banner(&self, f: &mut Frame, area: Rect, text: &str) {
        let paragraph = Paragraph::new(Line::from(text.to_string()))
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(paragraph, area);
    }

    fn render_calendar(&self, f: &mut Frame, area: Rect, year: i32, month: u32) {
        let Some(calendar) = self.engine.calendar_month(year, month) else {
            return;
        };

        let mut lines = vec![
            Line::from(" Su Mo Tu We Th Fr Sa"),
        ];
        let mut cells: Vec<Span> = (0..calendar.leading_blanks).map(|_| Span::raw("   ")).collect();
        for day in &calendar.days {
            let mut style = Style::default();
            if day.cleared {
                style = style.fg(Color::Green).add_modifier(Modifier::BOLD);
            }
            if day.is_today {
                style = style.bg(Color::Yellow).fg(Color::Black);
            }
            let label = if day.cleared { " ★".to_string() } else { format!("{:>3}", day.day) };
            cells.push(Span::styled(label, style));
            if cells.len() == 7 {
                lines.push(Line::from(std::mem::take(&mut cells)));
            }
        }
        if !cells.is_empty() {
            lines.push(Line::from(cells));
        }

        let block = Block::default()
            .title(format!("{}-{:02} ({} cleared) ← →", year, month, calendar.cleared_count()))
            .borders(Borders::ALL);
        f.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let help_text = Line::from(vec![
            Span::raw("ESC to quit | 1-4 to answer | Enter to continue | k calendar | c/h/a dress up"),
        ]);

        let help = Paragraph::new(help_text)
            .block(Block::default().borders(Borders::ALL));

        f.render_widget(help, area);
    }
}

fn hex_to_color(hex: &str) -> Color {
    let digits = hex.trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return Color::Cyan;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    match (channel(0), channel(2), channel(4)) {
        (Some(r), Some(g), Some(b)) => Color::Rgb(r, g, b),
        _ => Color::Cyan,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_to_color() {
        assert_eq!(hex_to_color("#3b82f6"), Color::Rgb(0x3b, 0x82, 0xf6));
        assert_eq!(hex_to_color("blue"), Color::Cyan);
        assert_eq!(hex_to_color("#zzzzzz"), Color::Cyan);
    }
}
