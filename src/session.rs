use anyhow::Result;
use std::io::{BufRead, Write};
use std::sync::Arc;

use crate::cascade::{Cascade, Reply};
use crate::transcript::Transcript;

pub const GOODBYE: &str = "Take care of yourself. Goodbye!";

/// One user's conversation: the shared cascade plus a private transcript.
pub struct Session {
    cascade: Arc<Cascade>,
    transcript: Transcript,
}

impl Session {
    pub fn new(cascade: Arc<Cascade>) -> Self {
        Self {
            cascade,
            transcript: Transcript::new(),
        }
    }

    /// Answers one message and records the exchange.
    pub fn turn(&mut self, text: &str) -> Reply {
        let reply = self.cascade.respond(text);
        self.transcript.record(text, reply.text.as_str());
        reply
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }
}

fn is_exit(line: &str, exit_token: &str) -> bool {
    line.eq_ignore_ascii_case(exit_token)
}

/// Line-oriented chat loop. Ends on `exit_token` or end of input.
pub fn run_repl<R: BufRead, W: Write>(
    session: &mut Session,
    input: R,
    mut output: W,
    exit_token: &str,
) -> Result<()> {
    writeln!(output, "Mental Health Support Chatbot")?;
    writeln!(output, "Type '{}' to end the conversation", exit_token)?;
    writeln!(output, "-----------------------------")?;

    let mut lines = input.lines();
    loop {
        write!(output, "You: ")?;
        output.flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => {
                writeln!(output)?;
                break;
            }
        };
        let user_input = line.trim();
        if user_input.is_empty() {
            continue;
        }
        if is_exit(user_input, exit_token) {
            writeln!(output, "Bot: {}", GOODBYE)?;
            break;
        }

        let reply = session.turn(user_input);
        log::debug!("Turn {} answered by {} stage", session.transcript().len(), reply.stage());
        writeln!(output, "Bot: {}", reply.text)?;
    }
    log::info!("Session ended after {} turns", session.transcript().len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::{ResponseSelector, ResponseTable, ResponseTableConfig};
    use crate::stage::tests::fixed;
    use crate::stage::{CrisisStage, EmpathyStage, FlowStage};
    use std::collections::HashMap;
    use std::io::Cursor;

    fn cascade() -> Arc<Cascade> {
        let table = |name: &str, default: &str| {
            ResponseTable::new(
                name,
                ResponseTableConfig {
                    responses: HashMap::new(),
                    default: default.to_string(),
                },
            )
            .unwrap()
        };
        Arc::new(Cascade::new(
            CrisisStage::new(fixed("false"), fixed("none"), "true"),
            FlowStage::new(fixed("unknown"), "unknown"),
            EmpathyStage::new(fixed("none")),
            ResponseSelector::new(
                table("crisis", "crisis default"),
                table("flow", "flow default"),
                table("empathy", "Tell me more."),
            ),
        ))
    }

    fn run(script: &str) -> (Session, String) {
        let mut session = Session::new(cascade());
        let mut output = Vec::new();
        run_repl(&mut session, Cursor::new(script), &mut output, "quit").unwrap();
        (session, String::from_utf8(output).unwrap())
    }

    #[test]
    fn quit_ends_the_session_with_goodbye() {
        let (session, output) = run("hello\n  QUIT \nnever read\n");
        assert_eq!(session.transcript().len(), 1);
        assert!(output.contains("Bot: Tell me more."));
        assert!(output.ends_with(&format!("Bot: {}\n", GOODBYE)));
        assert!(!output.contains("never read"));
    }

    #[test]
    fn end_of_input_ends_the_session() {
        let (session, output) = run("one\ntwo\n");
        assert_eq!(session.transcript().len(), 2);
        assert!(!output.contains(GOODBYE));
    }

    #[test]
    fn blank_lines_are_not_turns() {
        let (session, _) = run("\n   \nhello\nquit\n");
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.transcript().all()[0].user_text(), "hello");
    }

    #[test]
    fn sessions_keep_separate_transcripts() {
        let shared = cascade();
        let mut a = Session::new(shared.clone());
        let mut b = Session::new(shared);
        a.turn("first");
        a.turn("second");
        b.turn("only");
        assert_eq!(a.transcript().len(), 2);
        assert_eq!(b.transcript().len(), 1);
    }
}
