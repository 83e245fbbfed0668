//! Script worker thread
//!
//! Each evaluation gets its own thread and its own [`ChannelHost`]. Output
//! and input requests travel to the UI as [`Msg::Run`] messages; input
//! replies come back over a dedicated channel. The UI never blocks on the
//! worker.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::messages::{Msg, RunMsg};
use crate::script::{self, ScriptHost};

/// Stack for the worker; deep recursion up to the script limit needs room
pub const WORKER_STACK_SIZE: usize = 64 * 1024 * 1024;

/// How often a pending `input()` re-checks the cancel flag
const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Buffered output is flushed once it grows past this many bytes
const OUTPUT_FLUSH_BYTES: usize = 8 * 1024;

/// Longest time partial-line output may sit in the buffer
const OUTPUT_FLUSH_INTERVAL: Duration = Duration::from_millis(50);

/// [`ScriptHost`] that forwards everything over channels
pub struct ChannelHost {
    tx: Sender<Msg>,
    input_rx: Receiver<String>,
    cancel: Arc<AtomicBool>,
    pending: String,
    last_flush: Instant,
}

impl ChannelHost {
    pub fn new(tx: Sender<Msg>, input_rx: Receiver<String>, cancel: Arc<AtomicBool>) -> Self {
        Self {
            tx,
            input_rx,
            cancel,
            pending: String::new(),
            last_flush: Instant::now(),
        }
    }

    /// Send buffered output to the UI
    pub fn flush(&mut self) {
        self.last_flush = Instant::now();
        if !self.pending.is_empty() {
            let chunk = std::mem::take(&mut self.pending);
            let _ = self.tx.send(Msg::Run(RunMsg::Output(chunk)));
        }
    }
}

impl ScriptHost for ChannelHost {
    fn write_output(&mut self, text: &str) {
        self.pending.push_str(text);
        if self.pending.ends_with('\n') || self.pending.len() >= OUTPUT_FLUSH_BYTES {
            self.flush();
        } else {
            self.poll();
        }
    }

    fn poll(&mut self) {
        if !self.pending.is_empty() && self.last_flush.elapsed() >= OUTPUT_FLUSH_INTERVAL {
            self.flush();
        }
    }

    fn request_input(&mut self, prompt: &str) -> Option<String> {
        self.flush();
        if self
            .tx
            .send(Msg::Run(RunMsg::InputRequested(prompt.to_string())))
            .is_err()
        {
            return None;
        }

        loop {
            if self.should_stop() {
                return None;
            }
            match self.input_rx.recv_timeout(INPUT_POLL_INTERVAL) {
                Ok(answer) => return Some(answer),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    fn should_stop(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }
}

/// The UI's side of a running evaluation
///
/// Dropping the handle cancels the run.
#[derive(Debug)]
pub struct RunHandle {
    cancel: Arc<AtomicBool>,
    input_tx: Sender<String>,
    thread: Option<JoinHandle<()>>,
}

impl RunHandle {
    /// Answer the pending `input()` call
    pub fn provide_input(&self, answer: String) {
        let _ = self.input_tx.send(answer);
    }

    /// Interrupt the script at its next statement or pending input
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the worker thread to exit
    pub fn join(mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for RunHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Parse and run `source` on a new worker thread
///
/// Exactly one `RunMsg::Finished` is sent when the thread exits, after all
/// of the script's output.
pub fn spawn_evaluation(source: String, tx: Sender<Msg>) -> std::io::Result<RunHandle> {
    let cancel = Arc::new(AtomicBool::new(false));
    let (input_tx, input_rx) = mpsc::channel();
    let mut host = ChannelHost::new(tx.clone(), input_rx, Arc::clone(&cancel));

    let thread = std::thread::Builder::new()
        .name("script-worker".into())
        .stack_size(WORKER_STACK_SIZE)
        .spawn(move || {
            tracing::debug!("Evaluation started ({} bytes)", source.len());
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                script::run_source(&source, &mut host)
            }));
            host.flush();

            let result = match outcome {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e.to_string()),
                Err(_) => {
                    tracing::error!("Script worker panicked");
                    Err("internal interpreter error".to_string())
                }
            };
            tracing::debug!("Evaluation finished: {:?}", result);
            let _ = tx.send(Msg::Run(RunMsg::Finished(result)));
        })?;

    Ok(RunHandle {
        cancel,
        input_tx,
        thread: Some(thread),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_until_finished(rx: &Receiver<Msg>) -> (String, Result<(), String>) {
        let mut output = String::new();
        loop {
            match rx.recv_timeout(Duration::from_secs(10)).unwrap() {
                Msg::Run(RunMsg::Output(chunk)) => output.push_str(&chunk),
                Msg::Run(RunMsg::Finished(result)) => return (output, result),
                other => panic!("unexpected message {:?}", other),
            }
        }
    }

    #[test]
    fn test_output_then_finished() {
        let (tx, rx) = mpsc::channel();
        let handle = spawn_evaluation("print('a')\nprint('b', end='')".into(), tx).unwrap();
        let (output, result) = collect_until_finished(&rx);
        assert_eq!(output, "a\nb");
        assert_eq!(result, Ok(()));
        handle.join();
    }

    #[test]
    fn test_error_is_reported_once() {
        let (tx, rx) = mpsc::channel();
        let handle = spawn_evaluation("print(1)\n1 / 0\n".into(), tx).unwrap();
        let (output, result) = collect_until_finished(&rx);
        assert_eq!(output, "1\n");
        assert_eq!(result, Err("division by zero".to_string()));
        handle.join();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_partial_line_is_flushed_while_script_keeps_running() {
        let (tx, rx) = mpsc::channel();
        let handle = spawn_evaluation("print('.', end='')\nwhile True:\n    pass\n".into(), tx)
            .unwrap();
        match rx.recv_timeout(Duration::from_secs(10)).unwrap() {
            Msg::Run(RunMsg::Output(chunk)) => assert_eq!(chunk, "."),
            other => panic!("unexpected message {:?}", other),
        }
        handle.cancel();
        let (output, result) = collect_until_finished(&rx);
        assert_eq!(output, "");
        assert_eq!(result, Err("execution interrupted".to_string()));
    }

    #[test]
    fn test_cancel_interrupts_pending_input() {
        let (tx, rx) = mpsc::channel();
        let handle = spawn_evaluation("name = input('Name? ')\nprint(name)".into(), tx).unwrap();
        match rx.recv_timeout(Duration::from_secs(10)).unwrap() {
            Msg::Run(RunMsg::InputRequested(prompt)) => assert_eq!(prompt, "Name? "),
            other => panic!("unexpected message {:?}", other),
        }
        handle.cancel();
        let (output, result) = collect_until_finished(&rx);
        assert_eq!(output, "");
        assert_eq!(result, Err("execution interrupted".to_string()));
    }
}
