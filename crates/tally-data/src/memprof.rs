//! MEMPROF heap dump sessions.
//!
//! The heap profiler agent interleaves tagged lines with the program's own
//! output:
//!
//! ```text
//! MEMPROF: BEGIN heap-1
//! MEMPROF: DATA 24 java.lang.String
//! MEMPROF: DATA 16 java.lang.Object
//! MEMPROF: END heap-1
//! ```
//!
//! Every `BEGIN`/`END` pair is one session; at `END` the objects seen since
//! `BEGIN` are summed per type and reported by bytes.

use std::io::BufRead;

use tally_core::error::Result;
use tally_core::formatting::{format_memory_row, fraction};
use tally_core::models::{AggregateEntry, Allocation};
use tracing::debug;

use crate::aggregator::LineAggregator;

/// Prefix marking profiler lines.
pub const MEMPROF_IDENT: &str = "MEMPROF:";

/// Report column of [`Allocation`] that rows are ranked by (bytes).
const BYTES_INDEX: usize = 1;

// ── Commands ──────────────────────────────────────────────────────────────────

/// A parsed profiler line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemprofCommand {
    Begin(String),
    End(String),
    Data { size: u64, type_name: String },
}

/// Payload of a tagged line with the tag and surrounding whitespace removed,
/// or `None` for lines that do not carry the tag.
pub fn strip_ident(line: &str) -> Option<&str> {
    line.strip_prefix(MEMPROF_IDENT).map(str::trim)
}

/// Parse the payload of a tagged line.
pub fn parse_memprof_command(payload: &str) -> std::result::Result<MemprofCommand, String> {
    let mut tokens = payload.split_whitespace();
    let Some(cmd) = tokens.next() else {
        return Err("empty command".to_string());
    };
    let args: Vec<&str> = tokens.collect();

    match cmd {
        "BEGIN" | "END" => {
            if args.is_empty() {
                return Err(format!("{cmd} needs a label"));
            }
            let label = args.join(" ");
            Ok(if cmd == "BEGIN" {
                MemprofCommand::Begin(label)
            } else {
                MemprofCommand::End(label)
            })
        }
        "DATA" => {
            let [size, type_name] = args.as_slice() else {
                return Err(format!("DATA needs <size> <type>, got {} fields", args.len()));
            };
            let size = size
                .parse::<u64>()
                .map_err(|_| format!("size `{size}` is not a non-negative integer"))?;
            Ok(MemprofCommand::Data {
                size,
                type_name: type_name.to_string(),
            })
        }
        other => Err(format!("unknown command `{other}`")),
    }
}

// ── Session ───────────────────────────────────────────────────────────────────

/// How records outside a `BEGIN`/`END` pair are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionPolicy {
    /// `DATA` and `END` are accepted anywhere.
    #[default]
    Lenient,
    /// `DATA` and `END` outside a session are per-line errors.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Active(String),
}

/// One reported type with its exact sums.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRow {
    pub key: String,
    pub values: Allocation,
    /// Share of the session's bytes.
    pub fraction: f64,
}

/// Something the caller should show, in input order.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Begin {
        label: String,
    },
    End {
        label: String,
        total: AggregateEntry<Allocation>,
        rows: Vec<SessionRow>,
    },
    Diagnostic {
        line_no: usize,
        line: String,
        reason: String,
    },
}

impl SessionEvent {
    /// Text rendering of the event.
    pub fn render_lines(&self) -> Vec<String> {
        match self {
            SessionEvent::Begin { label } => vec![format!("# BEGIN {label}")],
            SessionEvent::End { label, total, rows } => {
                let mut lines = Vec::with_capacity(rows.len() + 2);
                let bytes = total.values.bytes as f64;
                let total_fraction = fraction(bytes, bytes);
                lines.push(format_memory_row(
                    total.values.count,
                    total.values.bytes,
                    total_fraction,
                    &total.key,
                ));
                for row in rows {
                    lines.push(format_memory_row(
                        row.values.count,
                        row.values.bytes,
                        row.fraction,
                        &row.key,
                    ));
                }
                lines.push(format!("# END {label}"));
                lines
            }
            SessionEvent::Diagnostic { line, reason, .. } => {
                vec![format!("Error processing line: {line} ({reason})")]
            }
        }
    }
}

/// Owns the per-type aggregate of one run and applies profiler lines to it.
#[derive(Debug)]
pub struct MemprofSession {
    totals: LineAggregator<Allocation>,
    state: SessionState,
    policy: SessionPolicy,
    min_fraction: f64,
    line_no: usize,
}

impl MemprofSession {
    pub fn new(min_fraction: f64, policy: SessionPolicy) -> Self {
        Self {
            totals: LineAggregator::new(),
            state: SessionState::Idle,
            policy,
            min_fraction,
            line_no: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn totals(&self) -> &LineAggregator<Allocation> {
        &self.totals
    }

    /// Apply one raw input line. Untagged lines and `#` comments yield
    /// nothing; a line that fails yields a diagnostic and leaves the session
    /// as it was.
    pub fn process_line(&mut self, raw: &str) -> Option<SessionEvent> {
        self.line_no += 1;
        let payload = strip_ident(raw)?;
        if payload.starts_with('#') {
            return None;
        }

        let outcome = parse_memprof_command(payload).and_then(|cmd| self.apply(cmd));
        match outcome {
            Ok(event) => event,
            Err(reason) => Some(self.diagnostic(payload, reason)),
        }
    }

    /// [`process_line`](Self::process_line) for a raw line that may not be
    /// UTF-8. Untagged garbage is skipped; a tagged line that does not
    /// decode yields a diagnostic.
    pub fn process_bytes(&mut self, raw: &[u8]) -> Option<SessionEvent> {
        if let Ok(line) = std::str::from_utf8(raw) {
            return self.process_line(line);
        }
        self.line_no += 1;
        if !raw.starts_with(MEMPROF_IDENT.as_bytes()) {
            return None;
        }
        let lossy = String::from_utf8_lossy(raw);
        let payload = strip_ident(&lossy).unwrap_or_default();
        Some(self.diagnostic(payload, "line is not valid UTF-8".to_string()))
    }

    fn diagnostic(&self, payload: &str, reason: String) -> SessionEvent {
        debug!("Line {}: {}", self.line_no, reason);
        SessionEvent::Diagnostic {
            line_no: self.line_no,
            line: payload.to_string(),
            reason,
        }
    }

    fn apply(&mut self, cmd: MemprofCommand) -> std::result::Result<Option<SessionEvent>, String> {
        match cmd {
            MemprofCommand::Begin(label) => {
                self.totals.reset();
                self.state = SessionState::Active(label.clone());
                debug!("Session {} started", label);
                Ok(Some(SessionEvent::Begin { label }))
            }
            MemprofCommand::Data { size, type_name } => {
                self.require_session("DATA")?;
                self.totals
                    .add(&type_name, Allocation::single(size))
                    .map_err(|e| e.to_string())?;
                Ok(None)
            }
            MemprofCommand::End(label) => {
                self.require_session("END")?;
                let rows: Vec<SessionRow> = self
                    .totals
                    .report(self.min_fraction, BYTES_INDEX)
                    .map_err(|e| e.to_string())?
                    .into_iter()
                    .filter_map(|row| {
                        self.totals.get(&row.key).map(|values| SessionRow {
                            key: row.key,
                            values: *values,
                            fraction: row.fraction,
                        })
                    })
                    .collect();
                self.state = SessionState::Idle;
                debug!("Session {} ended with {} types", label, self.totals.len());
                Ok(Some(SessionEvent::End {
                    label,
                    total: self.totals.total(),
                    rows,
                }))
            }
        }
    }

    fn require_session(&self, cmd: &str) -> std::result::Result<(), String> {
        if self.policy == SessionPolicy::Strict && self.state == SessionState::Idle {
            return Err(format!("{cmd} outside of a BEGIN/END session"));
        }
        Ok(())
    }
}

/// Feed every line of `reader` through `session`, handing each event to
/// `on_event` as it happens. Only read failures and `on_event` errors stop
/// the run; lines are read as bytes so that binary program output cannot.
pub fn run_memprof(
    mut reader: impl BufRead,
    session: &mut MemprofSession,
    mut on_event: impl FnMut(SessionEvent) -> Result<()>,
) -> Result<()> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        if let Some(event) = session.process_bytes(strip_line_end(&buf)) {
            on_event(event)?;
        }
    }
    Ok(())
}

fn strip_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
