//! Retry driver
//!
//! One exchange is one request and its response. Transient faults resend
//! the same bytes until the attempt budget is spent; a timeout costs an
//! attempt exactly like a short or corrupt frame.

use embedded_io::{Error as _, ErrorKind};
use heapless::Vec;

use cts600_hal::uart::{is_transient, Transport};
use cts600_protocol::frame::{FrameError, Request, Response, MAX_FRAME_SIZE};

use crate::error::{ExchangeError, ExchangeFault};

/// Bytes requested per read call
const READ_CHUNK: usize = 64;

/// Exchange counters, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ExchangeStats {
    /// Exchanges that got a response
    pub completed: u32,
    /// Requests written, retries included
    pub attempts: u32,
    pub checksum: u32,
    pub incomplete: u32,
    pub timeouts: u32,
    pub malformed: u32,
    /// Exchanges that ran out of attempts
    pub exhausted: u32,
}

impl ExchangeStats {
    fn count(&mut self, fault: ExchangeFault) {
        let counter = match fault {
            ExchangeFault::Checksum => &mut self.checksum,
            ExchangeFault::Incomplete => &mut self.incomplete,
            ExchangeFault::Timeout => &mut self.timeouts,
            ExchangeFault::Malformed => &mut self.malformed,
        };
        *counter = counter.saturating_add(1);
    }
}

/// Result of a single attempt
enum Attempt {
    Done(Response),
    Retry(ExchangeFault),
}

/// Sends requests and collects responses with bounded retries
#[derive(Debug)]
pub struct Exchanger {
    unit: u8,
    attempts: u8,
    rx: Vec<u8, MAX_FRAME_SIZE>,
    stats: ExchangeStats,
}

impl Exchanger {
    /// `attempts` below one is treated as one
    pub fn new(unit: u8, attempts: u8) -> Self {
        Self {
            unit,
            attempts: attempts.max(1),
            rx: Vec::new(),
            stats: ExchangeStats::default(),
        }
    }

    pub fn stats(&self) -> ExchangeStats {
        self.stats
    }

    /// Run one exchange
    pub fn exchange<P: Transport>(
        &mut self,
        port: &mut P,
        request: &Request,
    ) -> Result<Response, ExchangeError> {
        let frame = request
            .encode_to_vec(self.unit)
            .map_err(|_| ExchangeError::Fatal(ErrorKind::InvalidInput))?;

        let mut last = ExchangeFault::Timeout;
        for attempt in 1..=self.attempts {
            self.stats.attempts = self.stats.attempts.saturating_add(1);
            match self.attempt(port, &frame)? {
                Attempt::Done(response) => {
                    self.stats.completed = self.stats.completed.saturating_add(1);
                    return Ok(response);
                }
                Attempt::Retry(fault) => {
                    #[cfg(feature = "defmt")]
                    defmt::debug!(
                        "{} attempt {}/{}: {}",
                        request.function(),
                        attempt,
                        self.attempts,
                        fault
                    );
                    #[cfg(not(feature = "defmt"))]
                    let _ = attempt;
                    self.stats.count(fault);
                    last = fault;
                }
            }
        }

        self.stats.exhausted = self.stats.exhausted.saturating_add(1);
        Err(ExchangeError::Exhausted {
            attempts: self.attempts,
            last,
        })
    }

    fn attempt<P: Transport>(&mut self, port: &mut P, frame: &[u8]) -> Result<Attempt, ExchangeError> {
        self.rx.clear();

        if let Err(e) = port.write_all(frame).and_then(|_| port.flush()) {
            let kind = e.kind();
            return if is_transient(kind) {
                Ok(Attempt::Retry(ExchangeFault::Timeout))
            } else {
                Err(ExchangeError::Fatal(kind))
            };
        }

        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match Response::parse(&self.rx) {
                Ok((response, _)) => return Ok(Attempt::Done(response)),
                Err(FrameError::Incomplete) => {}
                Err(FrameError::Checksum { .. }) => {
                    return Ok(Attempt::Retry(ExchangeFault::Checksum))
                }
                Err(_) => return Ok(Attempt::Retry(ExchangeFault::Malformed)),
            }

            let room = self.rx.capacity() - self.rx.len();
            if room == 0 {
                return Ok(Attempt::Retry(ExchangeFault::Malformed));
            }

            let want = room.min(READ_CHUNK);
            let read = match port.read(&mut chunk[..want]) {
                Ok(n) => n,
                Err(e) if is_transient(e.kind()) => 0,
                Err(e) => return Err(ExchangeError::Fatal(e.kind())),
            };
            if read == 0 {
                return Ok(Attempt::Retry(self.silence()));
            }
            // `want` never exceeds the remaining capacity
            let _ = self.rx.extend_from_slice(&chunk[..read]);
        }
    }

    /// Fault for a read that returned nothing
    fn silence(&self) -> ExchangeFault {
        if self.rx.is_empty() {
            ExchangeFault::Timeout
        } else {
            ExchangeFault::Incomplete
        }
    }
}
