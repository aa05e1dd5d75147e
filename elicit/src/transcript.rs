//! Session transcript persistence.
//!
//! One block per round, preceded by a header naming the oracle persona and
//! terminated by a JSON dump of all recorded test responses.

use std::io::Write;

use crate::error::Result;
use crate::scoring::TestResponse;

/// Marker line preceding the final test-response dump.
pub const TEST_RESPONSES_MARKER: &str = "===TEST RESPONSES===";

/// Writes the plain-text session transcript.
pub struct TranscriptWriter {
    out: Box<dyn Write + Send>,
}

impl TranscriptWriter {
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self { out: Box::new(out) }
    }

    /// Header line naming the oracle persona for the session.
    pub fn persona_header(&mut self, persona: &str) -> Result<()> {
        writeln!(self.out, "0. {persona}\n")?;
        Ok(())
    }

    /// One completed round: index, question, answer.
    pub fn round(&mut self, index: usize, question: &str, answer: &str) -> Result<()> {
        writeln!(self.out, "{index}. {question}\n{answer}\n")?;
        Ok(())
    }

    /// Marks a round after which metrics were recomputed.
    pub fn eval_point(&mut self) -> Result<()> {
        writeln!(self.out, "EVAL POINT")?;
        Ok(())
    }

    /// Final dump of every recorded test response, one list per evaluation
    /// point.
    pub fn test_responses(&mut self, responses: &[Vec<TestResponse>]) -> Result<()> {
        writeln!(
            self.out,
            "{TEST_RESPONSES_MARKER}\n{}\n",
            serde_json::to_string_pretty(responses)?
        )?;
        self.out.flush()?;
        Ok(())
    }
}
