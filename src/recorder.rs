use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use serde::Serialize;

use crate::{Observer, Result, Script, ScriptId, State, Step};

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Record<'a> {
    Pulse {
        state: State,
    },
    BeforeInvoke {
        script: ScriptId,
    },
    AfterInvoke {
        script: ScriptId,
        step: &'a str,
        immediate: bool,
    },
    ScriptChanged {
        previous: ScriptId,
        next: ScriptId,
    },
}

/// An observer that records every lifecycle event as one JSON object per line.
///
/// Enable with the `recorder` feature.
///
/// ```rust,ignore
/// let recorder = Recorder::new("run.jsonl")?;
/// chain.add_observer(recorder);
/// ```
pub struct Recorder<W: Write + Send = BufWriter<File>> {
    writer: W,
}

impl Recorder {
    /// Create a new recorder that writes to the specified path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::from_writer(BufWriter::new(file)))
    }
}

impl<W: Write + Send> Recorder<W> {
    pub fn from_writer(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn record(&mut self, record: &Record<'_>) {
        if let Err(e) = serde_json::to_writer(&mut self.writer, record) {
            tracing::warn!(error = %e, "Recorder failed to serialize event");
            return;
        }
        if let Err(e) = self.writer.write_all(b"\n").and_then(|_| self.writer.flush()) {
            tracing::warn!(error = %e, "Recorder failed to write event");
        }
    }
}

impl<S, W: Write + Send> Observer<S> for Recorder<W> {
    fn on_pulse(&mut self, state: State) {
        self.record(&Record::Pulse { state });
    }

    fn on_before_invoke(&mut self, script: &Script<S>) {
        self.record(&Record::BeforeInvoke {
            script: script.id(),
        });
    }

    fn on_after_invoke(&mut self, script: &Script<S>, step: &Step<S>) {
        self.record(&Record::AfterInvoke {
            script: script.id(),
            step: step.kind(),
            immediate: step.is_immediate(),
        });
    }

    fn on_script_changed(&mut self, previous: &Script<S>, next: &Script<S>) {
        self.record(&Record::ScriptChanged {
            previous: previous.id(),
            next: next.id(),
        });
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;
    use crate::Chain;

    #[test]
    fn records_one_line_per_event() {
        let mut recorder = Recorder::from_writer(Vec::new());
        let script: Script = Script::new(|_| Ok(Step::complete()));

        Observer::<()>::on_pulse(&mut recorder, State::Unstarted);
        recorder.on_before_invoke(&script);
        recorder.on_after_invoke(&script, &Step::complete());

        let out = String::from_utf8(recorder.into_inner()).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], r#"{"event":"pulse","state":"Unstarted"}"#);
        assert!(lines[1].contains(r#""event":"before_invoke""#));
        assert!(lines[2].contains(r#""step":"Complete""#));
    }

    #[test]
    fn recorder_writes_json_file() {
        let path = std::env::temp_dir().join("stepchain_recorder_test.jsonl");
        let recorder = Recorder::new(&path).expect("Failed to create recorder");

        let mut chain = Chain::new(Script::new(|_| {
            Ok(Step::then(Script::new(|_| Ok(Step::complete()))))
        }));
        chain.add_observer(recorder);
        chain.pulse().unwrap();

        let mut content = String::new();
        File::open(&path)
            .expect("Failed to open log file")
            .read_to_string(&mut content)
            .expect("Failed to read log file");

        assert!(content.contains(r#""event":"pulse""#));
        assert!(content.contains(r#""event":"script_changed""#));
        assert!(content.contains(r#""step":"ContinueTo""#));

        let _ = std::fs::remove_file(path);
    }
}
