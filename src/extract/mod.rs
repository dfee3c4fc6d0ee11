//! Reply extraction from agent output.
//!
//! Two channels are supported: a file the agent writes its final message to,
//! and a JSON object embedded in noisy stdout. Neither ever truncates a
//! reply; anything over [`MAX_REPLY_BYTES`] is an error.

pub mod scan;

use std::path::Path;

use crate::error::{AssistError, Diagnostic, Result};
use crate::process::ProcessOutput;

/// Upper bound on a reply, in bytes.
pub const MAX_REPLY_BYTES: usize = 2 * 1024 * 1024;

/// Field of the embedded JSON object that carries the answer.
pub const RESPONSE_FIELD: &str = "response";

/// Read the reply an agent left in `path`.
///
/// Empty content is an error even though the process exited cleanly; the
/// captured output rides along as the diagnostic.
pub fn read_reply_file(agent: &str, path: &Path, output: &ProcessOutput) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|source| AssistError::OutputFile {
        agent: agent.to_string(),
        source,
    })?;

    check_reply_len(bytes.len())?;
    let reply = String::from_utf8_lossy(&bytes).into_owned();

    if reply.is_empty() {
        return Err(AssistError::EmptyReply {
            agent: agent.to_string(),
            diagnostic: Diagnostic::from_output(&output.stdout, &output.stderr),
        });
    }

    Ok(reply)
}

/// Pull the `response` string out of stdout that may contain banners or
/// trailers around the JSON object.
pub fn extract_embedded_reply(agent: &str, output: &ProcessOutput) -> Result<String> {
    let reply = scan::strip_to_object(&output.stdout)
        .and_then(|object| scan::extract_string_field(object, RESPONSE_FIELD));

    let Some(reply) = reply else {
        return Err(AssistError::Unparseable {
            agent: agent.to_string(),
            diagnostic: Diagnostic::stdout_first(&output.stdout, &output.stderr),
        });
    };

    check_reply_len(reply.len())?;

    if reply.is_empty() {
        return Err(AssistError::EmptyReply {
            agent: agent.to_string(),
            diagnostic: Diagnostic::from_output(&output.stdout, &output.stderr),
        });
    }

    Ok(reply)
}

fn check_reply_len(len: usize) -> Result<()> {
    if len > MAX_REPLY_BYTES {
        return Err(AssistError::ReplyTooLong {
            len,
            limit: MAX_REPLY_BYTES,
        });
    }
    Ok(())
}
