#[cfg(feature = "csv_plugin")]
pub mod csv_plugin;

use std::error::Error;

use dejavu_bridge::Event;

/// The number of events read at once if nothing else is requested.
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// The main trait that has to be implemented by an input plugin
pub trait EventSource {
    /// Error type when building the next Event
    type Error: Error;

    /// Queries the event source for a new Event in a blocking fashion.
    /// If there are no more events, None is returned.
    fn next_event(&mut self) -> Result<Option<Event>, Self::Error>;

    /// Turns the source into an iterator over batches of at most `size` events.
    ///
    /// A size of zero is treated as [DEFAULT_CHUNK_SIZE].
    fn chunks(self, size: usize) -> Chunks<Self>
    where
        Self: Sized,
    {
        Chunks::new(self, size)
    }
}

/// Reads an [EventSource] in batches, see [EventSource::chunks].
///
/// The last batch may be shorter. After the source is exhausted or reported an error, the iterator is fused.
#[derive(Debug)]
pub struct Chunks<S: EventSource> {
    source: S,
    size: usize,
    done: bool,
}

impl<S: EventSource> Chunks<S> {
    fn new(source: S, size: usize) -> Self {
        let size = if size == 0 { DEFAULT_CHUNK_SIZE } else { size };
        Chunks {
            source,
            size,
            done: false,
        }
    }

    /// The maximal number of events per batch.
    pub fn chunk_size(&self) -> usize {
        self.size
    }

    /// Returns the underlying source.
    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: EventSource> Iterator for Chunks<S> {
    type Item = Result<Vec<Event>, S::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut chunk = Vec::with_capacity(self.size.min(DEFAULT_CHUNK_SIZE));
        while chunk.len() < self.size {
            match self.source.next_event() {
                Ok(Some(event)) => chunk.push(event),
                Ok(None) => {
                    self.done = true;
                    break;
                },
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                },
            }
        }
        if chunk.is_empty() {
            None
        } else {
            Some(Ok(chunk))
        }
    }
}
