//! Module that implements [ResultSink] to represent the results in JSONL format.
use std::collections::BTreeMap;
use std::io::Write;

use dejavu_bridge::VerifyResult;
use serde::Serialize;

use super::{properties, ResultSink};

/// One line of the JSONL output.
#[derive(Serialize, Debug)]
struct JsonRecord<'a> {
    index: usize,
    #[serde(flatten)]
    result: &'a VerifyResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    properties: Option<BTreeMap<&'a str, &'a str>>,
}

/// Print the results in JSONL format to the writer
#[derive(Debug)]
pub struct JsonSink<W: Write> {
    writer: W,
    index: usize,
    with_properties: bool,
}

impl<W: Write> JsonSink<W> {
    /// Construct a new JsonSink writing one object per result
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            index: 0,
            with_properties: false,
        }
    }

    /// Additionally write the verdict as an object mapping each property to its value.
    pub fn with_properties(mut self) -> Self {
        self.with_properties = true;
        self
    }

    /// Returns the writer the results were written to.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ResultSink for JsonSink<W> {
    type Error = serde_json::Error;

    fn sink(&mut self, result: &VerifyResult) -> Result<(), Self::Error> {
        self.index += 1;
        let props = match (&result.verdict, self.with_properties && !result.is_eval_error()) {
            (Some(verdict), true) => Some(properties(verdict).into_iter().collect()),
            _ => None,
        };
        let record = JsonRecord {
            index: self.index,
            result,
            properties: props,
        };
        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer.write_all(b"\n").map_err(serde_json::Error::io)?;
        self.writer.flush().map_err(serde_json::Error::io)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value as JsonValue};

    use super::*;

    fn lines(sink: JsonSink<Vec<u8>>) -> Vec<JsonValue> {
        let out = String::from_utf8(sink.into_inner()).unwrap();
        out.lines().map(|l| serde_json::from_str(l).unwrap()).collect()
    }

    #[test]
    fn one_object_per_line() {
        let mut sink = JsonSink::new(Vec::new());
        sink.sink(&VerifyResult {
            original: "a,1".into(),
            modified: "a,1".into(),
            verdict: Some("p=true".into()),
        })
        .unwrap();
        sink.sink(&VerifyResult {
            original: "b".into(),
            modified: "skip".into(),
            verdict: None,
        })
        .unwrap();
        assert_eq!(
            lines(sink),
            vec![
                json!({"index": 1, "original": "a,1", "modified": "a,1", "verdict": "p=true"}),
                json!({"index": 2, "original": "b", "modified": "skip", "verdict": null}),
            ]
        );
    }

    #[test]
    fn properties_object() {
        let mut sink = JsonSink::new(Vec::new()).with_properties();
        sink.sink(&VerifyResult {
            original: "a".into(),
            modified: "a".into(),
            verdict: Some("p=true,q=false".into()),
        })
        .unwrap();
        let lines = lines(sink);
        assert_eq!(lines[0]["properties"], json!({"p": "true", "q": "false"}));
    }
}
