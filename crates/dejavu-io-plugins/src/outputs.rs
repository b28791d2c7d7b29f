#[cfg(feature = "json_plugin")]
pub mod json_plugin;
#[cfg(feature = "log_printer")]
pub mod log_printer;

use std::convert::Infallible;
use std::error::Error;

use dejavu_bridge::VerifyResult;

/// The main trait that has to be implemented by an output plugin
pub trait ResultSink {
    /// Error Type of a [ResultSink] implementation
    type Error: Error + 'static;

    /// Defines how a single result of the monitor needs to be handled
    fn sink(&mut self, result: &VerifyResult) -> Result<(), Self::Error>;

    /// Hands all results to [ResultSink::sink] in order, stopping at the first error.
    fn sink_all<'a, I>(&mut self, results: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = &'a VerifyResult>,
    {
        results.into_iter().try_for_each(|r| self.sink(r))
    }

    /// Called once after the last result.
    fn finish(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// A sink that drops every result, for runs where only the shared state or the statistics matter.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardSink {
    seen: usize,
}

impl DiscardSink {
    /// Number of results dropped so far.
    pub fn seen(&self) -> usize {
        self.seen
    }
}

impl ResultSink for DiscardSink {
    type Error = Infallible;

    fn sink(&mut self, _result: &VerifyResult) -> Result<(), Infallible> {
        self.seen += 1;
        Ok(())
    }
}

/// Splits a verdict line of the form `p=true,q=false` into its properties.
///
/// Segments that do not consist of exactly one name and one value are left out.
pub fn properties(verdict: &str) -> Vec<(&str, &str)> {
    verdict
        .split(',')
        .filter_map(|segment| {
            let mut parts = segment.split('=');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(name), Some(value), None) => Some((name.trim(), value.trim())),
                _ => None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn properties_of_verdict() {
        assert_eq!(properties("p=true, q = false"), vec![("p", "true"), ("q", "false")]);
        assert!(properties("").is_empty());
        assert_eq!(properties("garbage,p=true"), vec![("p", "true")]);
    }

    #[test]
    fn discard_counts() {
        let result = VerifyResult {
            original: "a,1".into(),
            modified: "a,1".into(),
            verdict: Some("p=true".into()),
        };
        let mut sink = DiscardSink::default();
        sink.sink_all([&result, &result]).unwrap();
        assert_eq!(sink.seen(), 2);
    }
}
