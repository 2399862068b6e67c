use std::io::{self, BufRead, Write};

/// Interactive questions asked during setup.
pub trait Prompter {
    /// Ask for a line of input; the trailing newline is stripped.
    fn ask(&mut self, label: &str) -> io::Result<String>;

    /// Ask a yes/no question. Only `y`/`yes` (any case) count as yes.
    fn confirm(&mut self, question: &str) -> io::Result<bool>;
}

/// Prompts on stdout and reads answers from stdin.
#[derive(Debug, Default)]
pub struct StdioPrompter {
    assume_yes: bool,
}

impl StdioPrompter {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Prompter for StdioPrompter {
    fn ask(&mut self, label: &str) -> io::Result<String> {
        print!("{}", label);
        io::stdout().flush()?;
        read_answer(&mut io::stdin().lock())
    }

    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        if self.assume_yes {
            println!("{} [y/n]: y", question);
            return Ok(true);
        }
        let answer = self.ask(&format!("{} [y/n]: ", question))?;
        Ok(is_yes(&answer))
    }
}

fn read_answer(input: &mut impl BufRead) -> io::Result<String> {
    let mut buf = String::new();
    if input.read_line(&mut buf)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "stdin closed before an answer was given",
        ));
    }
    Ok(buf.trim_end_matches(['\n', '\r']).to_owned())
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
