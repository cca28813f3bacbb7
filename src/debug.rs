use crate::types::Extent;
use crate::{SlotReport, SplitReport};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// JSON-lines record of every applied split: one `split.slot` line per slot,
/// then a `split.summary` line with the counters accumulated since the last
/// summary. Cloning shares the underlying file.
#[derive(Clone)]
pub(crate) struct DebugLogger {
    inner: Arc<Mutex<DebugState>>,
}

struct DebugState {
    writer: BufWriter<File>,
    counters: BTreeMap<&'static str, u64>,
}

impl DebugLogger {
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(DebugState {
                writer: BufWriter::new(file),
                counters: BTreeMap::new(),
            })),
        })
    }

    pub fn log_split(&self, report: &SplitReport) {
        let Ok(mut state) = self.inner.lock() else {
            return;
        };
        for slot in &report.slots {
            let line = slot_json(slot);
            let _ = writeln!(state.writer, "{line}");
        }
        let stats = &report.stats;
        state.bump("search.measurements", stats.measurements);
        state.bump("split.relocated", stats.relocated);
        state.bump("split.reflowed", stats.reflowed);
        state.bump("split.anchored", stats.anchored);
        state.bump("settle.polls", report.settle_polls as u64);
        state.bump("split.runs", 1);
        let summary = state.summary_json();
        let _ = writeln!(state.writer, "{summary}");
        let _ = state.writer.flush();
    }
}

impl DebugState {
    fn bump(&mut self, key: &'static str, amount: u64) {
        if amount == 0 {
            return;
        }
        let entry = self.counters.entry(key).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    // Drains the counters so each summary covers one run.
    fn summary_json(&mut self) -> String {
        let counts: Vec<String> = std::mem::take(&mut self.counters)
            .into_iter()
            .map(|(key, value)| format!("\"{}\":{}", key, value))
            .collect();
        format!("{{\"type\":\"split.summary\",\"counts\":{{{}}}}}", counts.join(","))
    }
}

fn slot_json(slot: &SlotReport) -> String {
    let (used_top, used_bottom) = match slot.used {
        Some(Extent { top, bottom }) => (top.to_string(), bottom.to_string()),
        None => ("null".to_string(), "null".to_string()),
    };
    format!(
        "{{\"type\":\"split.slot\",\"index\":{},\"capacity\":{},\"top\":{},\"inset_top\":{},\"used_top\":{},\"used_bottom\":{},\"expected_total\":{},\"real\":{},\"drift\":{}}}",
        slot.index,
        slot.capacity,
        slot.top,
        slot.inset_top,
        used_top,
        used_bottom,
        slot.expected_total,
        slot.real,
        slot.real - slot.expected_total
    )
}
