//! The script runtime: loads a named script and drives it line by line.
//!
//! A [`Runtime`] is a cheap handle; clones share one execution state. One task
//! may drive a script with [`Runtime::run`] (or step it with
//! [`Runtime::next_line`]) while another calls [`Runtime::stop`] or
//! [`Runtime::stop_all`]. Stops take effect between directives, never in the
//! middle of one.

use crate::error::{LineFault, RuntimeError};
use crate::evaluator::{Evaluator, LineKind, LineOutcome};
use crate::settings::Settings;
use crate::source::ScriptSource;
use crate::status::{Status, StatusIndicator, TracingIndicator};
use crate::transport::HidTransport;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Lifecycle of the runtime.
///
/// `Idle` and `Stopped` behave the same; `Idle` means nothing has run yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
    Idle,
    Running,
    Stopped,
}

/// Result of one [`Runtime::next_line`] call.
#[derive(Debug)]
pub enum Step {
    /// The line at the cursor ran and the cursor moved past it.
    Executed(LineOutcome),
    /// The cursor was already at the end; the runtime is now `Stopped`.
    Finished,
}

/// Summary returned by [`Runtime::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunReport {
    /// Script lines executed, not counting repeats.
    pub lines: usize,
    /// Repeat executions performed.
    pub repeats: usize,
    /// `true` if the script ran to its end, `false` if it was stopped or
    /// replaced by another script.
    pub completed: bool,
}

struct Script {
    name: String,
    lines: Vec<String>,
}

/// The last keystroke line and how many more times it should run.
#[derive(Default)]
struct RepeatContext {
    last_line: Option<String>,
    remaining: u32,
}

impl RepeatContext {
    fn record(&mut self, line: String, outcome: &LineOutcome) {
        match outcome.kind {
            LineKind::Keys => {
                self.last_line = Some(line);
                self.remaining = 0;
            }
            LineKind::Repeat if self.last_line.is_none() => {
                warn!("REPEAT with no previous keystroke line, ignoring");
                self.remaining = 0;
            }
            LineKind::Repeat => self.remaining = outcome.repeats,
            LineKind::Control => self.remaining = 0,
        }
    }

    fn take_one(&mut self) -> Option<String> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.last_line.clone()
    }
}

struct Session {
    state: RuntimeState,
    script: Option<Script>,
    cursor: usize,
    repeat: RepeatContext,
    // Bumped on every start so steps from a replaced script are discarded.
    generation: u64,
}

impl Session {
    fn accepts(&self, generation: Option<u64>) -> bool {
        self.state == RuntimeState::Running && generation.is_none_or(|g| g == self.generation)
    }

    /// Halt and release the script, returning its name if one was running.
    fn halt(&mut self) -> Option<String> {
        let was_running = self.state == RuntimeState::Running;
        self.state = RuntimeState::Stopped;
        self.cursor = 0;
        self.repeat = RepeatContext::default();
        let script = self.script.take();
        if was_running { script.map(|s| s.name) } else { None }
    }
}

struct Inner {
    session: Mutex<Session>,
    // Held for the whole of each step; always locked before `session`.
    evaluator: tokio::sync::Mutex<Evaluator>,
    source: Arc<dyn ScriptSource>,
    indicator: Arc<dyn StatusIndicator>,
}

/// Handle to the script runtime.
#[derive(Clone)]
pub struct Runtime {
    inner: Arc<Inner>,
}

impl Runtime {
    /// Create a runtime that reports status through `tracing`.
    pub fn new(
        source: Arc<dyn ScriptSource>,
        transport: Arc<dyn HidTransport>,
        settings: Settings,
    ) -> Self {
        Self::with_indicator(source, transport, settings, Arc::new(TracingIndicator))
    }

    pub fn with_indicator(
        source: Arc<dyn ScriptSource>,
        transport: Arc<dyn HidTransport>,
        settings: Settings,
        indicator: Arc<dyn StatusIndicator>,
    ) -> Self {
        let evaluator = Evaluator::new(transport, indicator.clone(), settings);
        Self {
            inner: Arc::new(Inner {
                session: Mutex::new(Session {
                    state: RuntimeState::Idle,
                    script: None,
                    cursor: 0,
                    repeat: RepeatContext::default(),
                    generation: 0,
                }),
                evaluator: tokio::sync::Mutex::new(evaluator),
                source,
                indicator,
            }),
        }
    }

    /// Run the named script to completion.
    ///
    /// Any script already running is stopped first. Lines execute in order
    /// with the active delay after each; `REPEAT` lines re-run the previous
    /// keystroke line. Returns early, with `completed == false`, if the script
    /// is stopped or replaced from another task.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::FileNotFound`] if the source has no such script;
    /// the runtime state is left untouched in that case.
    pub async fn run(&self, name: &str) -> Result<RunReport, RuntimeError> {
        let generation = self.load(name).await?;
        let mut report = RunReport::default();

        loop {
            let outcome = match self.step(Some(generation)).await {
                Ok(Step::Executed(outcome)) => outcome,
                Ok(Step::Finished) => {
                    report.completed = true;
                    break;
                }
                Err(RuntimeError::NotRunning) => break,
                Err(err) => return Err(err),
            };
            report.lines += 1;
            pause(outcome.delay).await;

            loop {
                match self.repeat_step(Some(generation)).await {
                    Ok(Some(outcome)) => {
                        report.repeats += 1;
                        pause(outcome.delay).await;
                    }
                    Ok(None) | Err(RuntimeError::NotRunning) => break,
                    Err(err) => return Err(err),
                }
            }
        }

        info!(
            script = name,
            lines = report.lines,
            repeats = report.repeats,
            completed = report.completed,
            "script run ended"
        );
        Ok(report)
    }

    /// Load the named script and enter `Running` without executing anything.
    ///
    /// Drive it afterwards with [`next_line`](Self::next_line) and
    /// [`repeat`](Self::repeat).
    pub async fn start(&self, name: &str) -> Result<(), RuntimeError> {
        self.load(name).await.map(|_| ())
    }

    /// Execute the line at the cursor and advance the cursor.
    ///
    /// Does not apply the line's delay; single-step drivers wait for
    /// `outcome.delay` themselves.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::NotRunning`] if no script is running.
    pub async fn next_line(&self) -> Result<Step, RuntimeError> {
        self.step(None).await
    }

    /// Re-run the last keystroke line if a `REPEAT` is pending.
    ///
    /// Returns `Ok(None)` once the pending count is used up.
    pub async fn repeat(&self) -> Result<Option<LineOutcome>, RuntimeError> {
        self.repeat_step(None).await
    }

    /// Stop whatever is running. Calling it again has no further effect.
    pub fn stop_all(&self) {
        let stopped = self.session().halt();
        if let Some(name) = stopped {
            info!(script = %name, "script stopped");
            self.inner.indicator.notify(Status::Stopped);
        }
    }

    /// Stop the runtime only if `name` is the running script.
    ///
    /// Returns whether it was stopped.
    pub fn stop(&self, name: &str) -> bool {
        let stopped = {
            let mut session = self.session();
            let matches = session.state == RuntimeState::Running
                && session.script.as_ref().is_some_and(|s| s.name == name);
            if matches { session.halt() } else { None }
        };
        match stopped {
            Some(name) => {
                info!(script = %name, "script stopped");
                self.inner.indicator.notify(Status::Stopped);
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == RuntimeState::Running
    }

    /// Name of the running script, if any.
    pub fn current_script(&self) -> Option<String> {
        let session = self.session();
        match session.state {
            RuntimeState::Running => session.script.as_ref().map(|s| s.name.clone()),
            _ => None,
        }
    }

    pub fn state(&self) -> RuntimeState {
        self.session().state
    }

    /// Index of the next line to execute.
    pub fn cursor(&self) -> usize {
        self.session().cursor
    }

    /// Evaluate one line outside of any loaded script.
    ///
    /// The line sees and changes the same timing and layout settings as the
    /// running script. A `REPEAT` line is only reported through
    /// `outcome.repeats`; nothing is re-run.
    pub async fn evaluate(&self, line: &str) -> LineOutcome {
        self.inner.evaluator.lock().await.evaluate(line).await
    }

    async fn load(&self, name: &str) -> Result<u64, RuntimeError> {
        let lines = match self.inner.source.open_script(name) {
            Ok(lines) => lines,
            Err(err) => {
                warn!(script = name, error = %err, "cannot open script");
                self.inner.indicator.notify(Status::Error);
                return Err(err.into());
            }
        };
        let line_count = lines.len();

        let mut evaluator = self.inner.evaluator.lock().await;
        let (generation, previous) = {
            let mut session = self.session();
            let previous = session.halt();
            session.generation += 1;
            session.state = RuntimeState::Running;
            session.script = Some(Script {
                name: name.to_string(),
                lines,
            });
            (session.generation, previous)
        };
        evaluator.reset();
        drop(evaluator);

        if let Some(previous) = previous {
            info!(script = %previous, "stopped to start another script");
        }
        info!(script = name, lines = line_count, "script started");
        self.inner.indicator.notify(Status::Running);
        Ok(generation)
    }

    async fn step(&self, expected: Option<u64>) -> Result<Step, RuntimeError> {
        let mut evaluator = self.inner.evaluator.lock().await;
        let next = {
            let mut session = self.session();
            if !session.accepts(expected) {
                return Err(RuntimeError::NotRunning);
            }
            let line = session
                .script
                .as_ref()
                .and_then(|script| script.lines.get(session.cursor))
                .cloned();
            match line {
                Some(line) => Ok((line, session.generation)),
                None => Err(session.halt()),
            }
        };
        let (line, generation) = match next {
            Ok(next) => next,
            Err(finished) => {
                if let Some(name) = finished {
                    info!(script = %name, "script finished");
                }
                self.inner.indicator.notify(Status::Stopped);
                return Ok(Step::Finished);
            }
        };

        debug!(line = %line, "executing");
        let outcome = evaluator.evaluate(&line).await;
        drop(evaluator);
        self.report_faults(&outcome);

        let mut session = self.session();
        if session.accepts(Some(generation)) {
            session.cursor += 1;
            session.repeat.record(line, &outcome);
        }
        Ok(Step::Executed(outcome))
    }

    async fn repeat_step(&self, expected: Option<u64>) -> Result<Option<LineOutcome>, RuntimeError> {
        let mut evaluator = self.inner.evaluator.lock().await;
        let line = {
            let mut session = self.session();
            if !session.accepts(expected) {
                return Err(RuntimeError::NotRunning);
            }
            match session.repeat.take_one() {
                Some(line) => line,
                None => return Ok(None),
            }
        };

        debug!(line = %line, "repeating");
        let outcome = evaluator.evaluate(&line).await;
        drop(evaluator);
        self.report_faults(&outcome);
        Ok(Some(outcome))
    }

    fn report_faults(&self, outcome: &LineOutcome) {
        let transport_failed = outcome
            .faults
            .iter()
            .any(|fault| matches!(fault, LineFault::Transport(_)));
        if transport_failed {
            self.inner.indicator.notify(Status::Error);
        }
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.inner
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context_with(line: &str) -> RepeatContext {
        RepeatContext {
            last_line: Some(line.to_string()),
            remaining: 0,
        }
    }

    fn outcome(kind: LineKind, repeats: u32) -> LineOutcome {
        LineOutcome {
            kind,
            repeats,
            delay: Duration::ZERO,
            faults: Vec::new(),
        }
    }

    #[test]
    fn test_repeat_context_counts_down() {
        let mut ctx = context_with("STRING a");
        ctx.record("REPEAT 2".to_string(), &outcome(LineKind::Repeat, 2));
        assert_eq!(ctx.take_one().as_deref(), Some("STRING a"));
        assert_eq!(ctx.take_one().as_deref(), Some("STRING a"));
        assert_eq!(ctx.take_one(), None);
        assert_eq!(ctx.take_one(), None);
    }

    #[test]
    fn test_repeat_without_previous_line_is_ignored() {
        let mut ctx = RepeatContext::default();
        ctx.record("REPEAT 5".to_string(), &outcome(LineKind::Repeat, 5));
        assert_eq!(ctx.take_one(), None);
    }

    #[test]
    fn test_control_line_clears_pending_but_keeps_target() {
        let mut ctx = context_with("ENTER");
        ctx.record("REPEAT 3".to_string(), &outcome(LineKind::Repeat, 3));
        ctx.record("DELAY 10".to_string(), &outcome(LineKind::Control, 0));
        assert_eq!(ctx.take_one(), None);

        ctx.record("REPEAT 1".to_string(), &outcome(LineKind::Repeat, 1));
        assert_eq!(ctx.take_one().as_deref(), Some("ENTER"));
    }

    #[test]
    fn test_keystroke_line_replaces_target() {
        let mut ctx = context_with("ENTER");
        ctx.record("TAB".to_string(), &outcome(LineKind::Keys, 0));
        ctx.record("REPEAT".to_string(), &outcome(LineKind::Repeat, 1));
        assert_eq!(ctx.take_one().as_deref(), Some("TAB"));
    }
}
