//! Update channel fed by server-pushed messages.
//!
//! Each new generation is announced on the sink so the producer learns its
//! id. A reader thread decodes the feed line by line and queues the results;
//! the channel drains the queue on `pump` and routes each message to the
//! subscription for its generation id.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::{debug, warn};

use crate::error::{ChannelError, WireError};
use crate::generation::GenerationId;

use super::UpdateChannel;
use super::types::{Delivery, GenerationHandler, SharedState, Subscription};
use super::wire::{InboundMessage, OutboundMessage, decode_line, encode_line};

pub type Inbound = Result<InboundMessage, WireError>;

/// Messages kept per generation id that has no subscriber yet.
const BACKLOG_PER_ID: usize = 32;
/// Distinct unsubscribed ids kept at once; the oldest is evicted first.
const BACKLOG_IDS: usize = 64;

fn read_feed<R: BufRead>(reader: R, tx: &Sender<Inbound>) {
    for line in reader.lines() {
        let decoded = match line {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => decode_line(&line),
            Err(e) => {
                let _ = tx.send(Err(WireError::Io(e)));
                break;
            }
        };
        if tx.send(decoded).is_err() {
            break;
        }
    }
    debug!("relay feed reader finished");
}

/// Spawn a thread that decodes `reader` line by line into `tx`.
///
/// Blank lines are skipped. The thread ends at EOF, on a read error, or when
/// the receiving channel is dropped.
pub fn spawn_feed_reader<R>(reader: R, tx: Sender<Inbound>) -> JoinHandle<()>
where
    R: BufRead + Send + 'static,
{
    thread::spawn(move || read_feed(reader, &tx))
}

// Opening a named pipe blocks until the producer connects, so the open
// happens on the reader thread.
fn spawn_path_reader(path: PathBuf, tx: Sender<Inbound>) -> JoinHandle<()> {
    thread::spawn(move || match File::open(&path) {
        Ok(file) => read_feed(BufReader::new(file), &tx),
        Err(e) => {
            let _ = tx.send(Err(WireError::Io(e)));
        }
    })
}

struct RelayRoute {
    delivery: Delivery,
    last_progress: Option<f64>,
}

/// Routes decoded feed messages to per-generation handlers.
pub struct RelayChannel {
    inbound: Receiver<Inbound>,
    sink: Option<Box<dyn Write + Send>>,
    routes: HashMap<GenerationId, RelayRoute>,
    /// Messages that arrived before their subscription, by id.
    backlog: HashMap<GenerationId, VecDeque<InboundMessage>>,
    backlog_order: VecDeque<GenerationId>,
    /// Backlogged messages of a fresh subscription, dispatched on next pump.
    replay: VecDeque<InboundMessage>,
    /// Ids whose subscription finished; their late messages are dropped.
    settled: HashSet<GenerationId>,
    feed_closed: bool,
}

impl RelayChannel {
    pub fn new(inbound: Receiver<Inbound>) -> Self {
        Self {
            inbound,
            sink: None,
            routes: HashMap::new(),
            backlog: HashMap::new(),
            backlog_order: VecDeque::new(),
            replay: VecDeque::new(),
            settled: HashSet::new(),
            feed_closed: false,
        }
    }

    /// Decode messages from `reader` on a background thread.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        spawn_feed_reader(reader, tx);
        Self::new(rx)
    }

    /// Write `submitted` announcements to `sink`.
    pub fn with_sink(mut self, sink: impl Write + Send + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Read the feed at `feed` (file or named pipe) and append announcements
    /// to `sink`.
    pub fn open(feed: &Path, sink: &Path) -> Result<Self, ChannelError> {
        fs::metadata(feed).map_err(|source| ChannelError::OpenFeed {
            path: feed.to_path_buf(),
            source,
        })?;
        let sink_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(sink)
            .map_err(|source| ChannelError::OpenSink {
                path: sink.to_path_buf(),
                source,
            })?;

        let (tx, rx) = mpsc::channel();
        spawn_path_reader(feed.to_path_buf(), tx);
        Ok(Self::new(rx).with_sink(sink_file))
    }

    fn hold_back(&mut self, message: InboundMessage) {
        let id = message.generation_id().clone();
        if !self.backlog.contains_key(&id) {
            if self.backlog_order.len() >= BACKLOG_IDS {
                if let Some(oldest) = self.backlog_order.pop_front() {
                    self.backlog.remove(&oldest);
                    debug!(generation = %oldest, "backlog evicted");
                }
            }
            self.backlog_order.push_back(id.clone());
        }
        let queue = self.backlog.entry(id.clone()).or_default();
        if queue.len() >= BACKLOG_PER_ID {
            debug!(generation = %id, "backlog full, message dropped");
            return;
        }
        debug!(generation = %id, "message held until subscription");
        queue.push_back(message);
    }

    fn dispatch(&mut self, message: InboundMessage) -> usize {
        let Some(route) = self.routes.get_mut(message.generation_id()) else {
            if self.settled.contains(message.generation_id()) {
                debug!(generation = %message.generation_id(), "message for settled generation dropped");
            } else {
                self.hold_back(message);
            }
            return 0;
        };

        match message {
            InboundMessage::Progress {
                generation_id,
                progress,
            } => {
                let fresh = match route.last_progress {
                    _ if progress.is_nan() => false,
                    Some(last) => progress.min(100.0) > last,
                    None => progress >= 0.0,
                };
                let progress = progress.min(100.0);
                if !fresh {
                    debug!(generation = %generation_id, progress, last = ?route.last_progress, "stale progress dropped");
                    return 0;
                }
                route.last_progress = Some(progress);
                usize::from(route.delivery.progress(progress))
            }
            InboundMessage::Completed { audio_url, .. } => {
                let mut fired = 0;
                if route.last_progress.is_none_or(|last| last < 100.0) {
                    route.last_progress = Some(100.0);
                    fired += usize::from(route.delivery.progress(100.0));
                }
                fired + usize::from(route.delivery.complete(&audio_url))
            }
            InboundMessage::Failed { error, .. } => usize::from(route.delivery.fail(&error)),
        }
    }
}

impl UpdateChannel for RelayChannel {
    fn subscribe(
        &mut self,
        id: &GenerationId,
        handler: Box<dyn GenerationHandler>,
    ) -> Subscription {
        let state = SharedState::new();
        debug!(generation = %id, "relay subscription started");
        self.routes.insert(
            id.clone(),
            RelayRoute {
                delivery: Delivery::new(state.clone(), handler),
                last_progress: None,
            },
        );
        if let Some(held) = self.backlog.remove(id) {
            self.backlog_order.retain(|queued| queued != id);
            self.replay.extend(held);
        }
        Subscription::new(id.clone(), state)
    }

    fn announce(&mut self, id: &GenerationId, prompt: &str) {
        let Some(sink) = self.sink.as_mut() else {
            debug!(generation = %id, "relay has no sink, announcement skipped");
            return;
        };
        let message = OutboundMessage::Submitted {
            generation_id: id,
            prompt,
        };
        let written = encode_line(&message).and_then(|line| {
            sink.write_all(line.as_bytes())?;
            sink.flush()?;
            Ok(())
        });
        match written {
            Ok(()) => debug!(generation = %id, "generation announced"),
            Err(e) => warn!(generation = %id, "relay sink: {e}"),
        }
    }

    fn pump(&mut self, _now: Instant) -> usize {
        let mut fired = 0;

        while let Some(message) = self.replay.pop_front() {
            fired += self.dispatch(message);
        }

        loop {
            match self.inbound.try_recv() {
                Ok(Ok(message)) => fired += self.dispatch(message),
                Ok(Err(e)) => warn!("relay feed: {e}"),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.feed_closed {
                        warn!("relay feed closed");
                        self.feed_closed = true;
                    }
                    break;
                }
            }
        }

        let finished: Vec<GenerationId> = self
            .routes
            .iter()
            .filter(|(_, route)| !route.delivery.is_live())
            .map(|(id, _)| id.clone())
            .collect();
        for id in finished {
            self.routes.remove(&id);
            self.settled.insert(id);
        }
        fired
    }

    fn name(&self) -> &'static str {
        "relay"
    }
}
