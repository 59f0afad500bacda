use std::io::Write;

use anyhow::Result;
use ponto_core::Department;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Line-oriented operator input on stdin.
pub struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Print `question` and read one trimmed line; `None` on end of input.
    pub async fn ask(&mut self, question: &str) -> Result<Option<String>> {
        print!("{question}");
        std::io::stdout().flush()?;
        Ok(self
            .lines
            .next_line()
            .await?
            .map(|line| line.trim().to_string()))
    }

    pub async fn confirm(&mut self, question: &str) -> Result<bool> {
        Ok(self
            .ask(&format!("{question} [s/N] "))
            .await?
            .is_some_and(|answer| is_yes(&answer)))
    }
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.to_lowercase().as_str(), "s" | "sim" | "y" | "yes")
}

/// Accept a 1-based index into [`Department::ALL`] or the exact name.
pub fn parse_department(input: &str) -> Option<Department> {
    let input = input.trim();
    if let Ok(n) = input.parse::<usize>() {
        return n
            .checked_sub(1)
            .and_then(|i| Department::ALL.get(i))
            .copied();
    }
    input.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("s"));
        assert!(is_yes("SIM"));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
    }

    #[test]
    fn test_parse_department_by_index() {
        assert_eq!(parse_department("1"), Some(Department::Diretoria));
        assert_eq!(
            parse_department(" 9 "),
            Some(Department::PesquisaDesenvolvimento)
        );
        assert_eq!(parse_department("0"), None);
        assert_eq!(parse_department("10"), None);
    }

    #[test]
    fn test_parse_department_by_name() {
        assert_eq!(
            parse_department("Recursos Humanos"),
            Some(Department::RecursosHumanos)
        );
        assert_eq!(parse_department("Vendas"), None);
    }
}
