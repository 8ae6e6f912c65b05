//! Line-oriented terminal input.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

/// Reads trimmed lines, from stdin unless built over another reader.
pub struct Prompt<R = BufReader<Stdin>> {
    lines: Lines<R>,
}

impl Prompt {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> Prompt<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }

    /// Next line, or `None` at end of input. Cancel-safe.
    pub async fn line(&mut self) -> std::io::Result<Option<String>> {
        Ok(self
            .lines
            .next_line()
            .await?
            .map(|l| l.trim().to_string()))
    }

    /// Prints `question` without waiting for the answer.
    pub fn show(&self, question: &str) -> std::io::Result<()> {
        print!("{question} ");
        std::io::stdout().flush()
    }

    /// Prints `question` and reads the answer.
    pub async fn ask(&mut self, question: &str) -> std::io::Result<Option<String>> {
        self.show(question)?;
        self.line().await
    }

    /// Yes/no question; anything but `y`/`yes` is a no.
    pub async fn confirm(&mut self, question: &str) -> std::io::Result<bool> {
        let answer = self.ask(&confirm_question(question)).await?;
        Ok(is_yes(answer.as_deref()))
    }
}

pub fn confirm_question(question: &str) -> String {
    format!("{question} [y/N]")
}

/// `y`/`yes` in any case; end of input counts as no.
pub fn is_yes(answer: Option<&str>) -> bool {
    answer.is_some_and(|a| matches!(a.to_lowercase().as_str(), "y" | "yes"))
}
