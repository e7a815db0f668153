//! Line-oriented console I/O for the menu and its prompts.
//!
//! Input and output are generic so tests can script a session with an in-memory
//! reader and capture everything that would have been printed.

use std::fmt::Display;
use std::io::{self, BufRead, Stdin, StdinLock, Stdout, Write};

use crate::error::PromptError;

/// How many times an interactive question is asked before giving up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Keep asking until a valid answer arrives or input closes.
    #[default]
    Unbounded,
    /// Give up with [`PromptError::AttemptsExhausted`] after this many rejected answers.
    MaxAttempts(usize),
}

impl RetryPolicy {
    pub fn from_max_attempts(max_attempts: Option<usize>) -> Self {
        max_attempts.map_or(Self::Unbounded, Self::MaxAttempts)
    }

    fn allows(self, attempts: usize) -> bool {
        match self {
            Self::Unbounded => true,
            Self::MaxAttempts(max) => attempts < max,
        }
    }
}

pub struct Console<R, W> {
    input: R,
    output: W,
    policy: RetryPolicy,
}

pub type StdConsole = Console<StdinLock<'static>, Stdout>;

impl StdConsole {
    pub fn stdio(policy: RetryPolicy) -> Self {
        let stdin: Stdin = io::stdin();
        Console::new(stdin.lock(), io::stdout(), policy)
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W, policy: RetryPolicy) -> Self {
        Self {
            input,
            output,
            policy,
        }
    }

    /// Print one line.
    pub fn say(&mut self, line: impl Display) -> Result<(), PromptError> {
        writeln!(self.output, "{}", line)?;
        Ok(())
    }

    /// Print an empty line followed by `line` (section spacing).
    pub fn section(&mut self, line: impl Display) -> Result<(), PromptError> {
        writeln!(self.output)?;
        self.say(line)
    }

    /// Print `message` without a newline and read one trimmed line.
    pub fn prompt(&mut self, message: &str) -> Result<String, PromptError> {
        write!(self.output, "{}", message)?;
        self.output.flush()?;
        let mut buf = String::new();
        if self.input.read_line(&mut buf)? == 0 {
            return Err(PromptError::Closed);
        }
        Ok(buf.trim().to_string())
    }

    /// Ask `message` until `accept` returns a value.
    ///
    /// `accept` receives the console (to print rejections) and the trimmed answer;
    /// returning `Ok(None)` rejects it and asks again while the policy allows.
    pub fn ask_until<T>(
        &mut self,
        message: &str,
        mut accept: impl FnMut(&mut Self, &str) -> Result<Option<T>, PromptError>,
    ) -> Result<T, PromptError> {
        let mut rejected = 0;
        loop {
            let answer = self.prompt(message)?;
            if let Some(value) = accept(self, &answer)? {
                return Ok(value);
            }
            rejected += 1;
            if !self.policy.allows(rejected) {
                tracing::warn!(prompt = message, attempts = rejected, "giving up on prompt");
                return Err(PromptError::AttemptsExhausted {
                    prompt: message.trim().to_string(),
                    attempts: rejected,
                });
            }
        }
    }
}

/// Console over scripted input with captured output, for tests.
pub type ScriptedConsole = Console<io::Cursor<Vec<u8>>, Vec<u8>>;

impl ScriptedConsole {
    pub fn scripted(lines: &[&str], policy: RetryPolicy) -> Self {
        let mut script = lines.join("\n");
        script.push('\n');
        Console::new(io::Cursor::new(script.into_bytes()), Vec::new(), policy)
    }

    /// Everything printed so far.
    pub fn transcript(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_trims_and_echoes_message() {
        let mut console = ScriptedConsole::scripted(&["  hello  "], RetryPolicy::Unbounded);
        let answer = console.prompt("Say: ").unwrap();
        assert_eq!(answer, "hello");
        assert_eq!(console.transcript(), "Say: ");
    }

    #[test]
    fn test_prompt_reports_closed_input() {
        let mut console = ScriptedConsole::scripted(&["only"], RetryPolicy::Unbounded);
        console.prompt("> ").unwrap();
        assert!(matches!(console.prompt("> "), Err(PromptError::Closed)));
    }

    #[test]
    fn test_ask_until_retries_until_accepted() {
        let mut console = ScriptedConsole::scripted(&["a", "b", "42"], RetryPolicy::Unbounded);
        let value = console
            .ask_until("Number: ", |c, answer| match answer.parse::<u32>() {
                Ok(n) => Ok(Some(n)),
                Err(_) => {
                    c.say("nope")?;
                    Ok(None)
                }
            })
            .unwrap();
        assert_eq!(value, 42);
        assert_eq!(console.transcript().matches("nope").count(), 2);
        assert_eq!(console.transcript().matches("Number: ").count(), 3);
    }

    #[test]
    fn test_ask_until_respects_max_attempts() {
        let mut console =
            ScriptedConsole::scripted(&["x", "y", "z", "1"], RetryPolicy::MaxAttempts(2));
        let result = console.ask_until("Number: ", |_, answer| Ok(answer.parse::<u32>().ok()));
        match result {
            Err(PromptError::AttemptsExhausted { attempts, .. }) => assert_eq!(attempts, 2),
            other => panic!("expected exhausted attempts, got {:?}", other),
        }
    }

    #[test]
    fn test_policy_from_config() {
        assert_eq!(RetryPolicy::from_max_attempts(None), RetryPolicy::Unbounded);
        assert_eq!(
            RetryPolicy::from_max_attempts(Some(3)),
            RetryPolicy::MaxAttempts(3)
        );
    }
}
