//! Room actor: an isolated Tokio task that owns one room's seat table.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc command channel. The worker loop executes one command
//! at a time, so the seat table is never touched from two execution
//! contexts — message passing is the room's entire locking story.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Weak;
use std::sync::atomic::{AtomicU8, Ordering};

use bytes::Bytes;
use seatcast_protocol::{RoomId, SeatId};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::time::{self, Instant};

use crate::{ClientStream, RoomConfig, RoomError, RoomRegistry, RoomStatus};

/// One slot in the seat table. Exactly one entry exists per seat id.
///
/// `Claimed` sits between `Vacant` and `Bound`: the seat is reserved and
/// excluded from allocation, but no client is attached yet. A claimed
/// seat cannot send or receive broadcasts until it is bound.
enum Seat {
    Vacant,
    Claimed,
    Bound(Box<dyn ClientStream>),
}

impl Seat {
    fn is_vacant(&self) -> bool {
        matches!(self, Self::Vacant)
    }

    fn is_bound(&self) -> bool {
        matches!(self, Self::Bound(_))
    }
}

/// Commands sent to a room worker through its channel.
///
/// Each variant carries a `oneshot::Sender` reply channel — the caller
/// submits a command and awaits the paired response, which gives every
/// operation synchronous call semantics over the async queue.
enum RoomCommand {
    ClaimSeat {
        reply: oneshot::Sender<Result<SeatId, RoomError>>,
    },
    Attach {
        seat_id: SeatId,
        client: Box<dyn ClientStream>,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Detach {
        seat_id: SeatId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Broadcast {
        from: SeatId,
        payload: Bytes,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Info {
        reply: oneshot::Sender<RoomInfo>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
}

/// A snapshot of room metadata.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub capacity: u32,
    /// Seats that are claimed or bound.
    pub occupied: u32,
}

/// State shared between every clone of a [`Room`] handle.
struct RoomShared {
    id: RoomId,
    config: RoomConfig,
    cmd_tx: mpsc::Sender<RoomCommand>,
    status: AtomicU8,
}

/// Handle to a room. Cheap to clone; the registry holds one per room.
///
/// All operations except [`id`](Self::id), [`capacity`](Self::capacity)
/// and [`status`](Self::status) submit a command into the room's serial
/// queue and await the reply. Submitting to a room whose worker is not
/// running fails fast with [`RoomError::NotServing`] instead of
/// blocking forever.
#[derive(Clone)]
pub struct Room {
    shared: Arc<RoomShared>,
    /// The worker, present until `serve` takes it. Shared across handle
    /// clones so exactly one `serve` call can win it.
    worker: Arc<Mutex<Option<RoomWorker>>>,
}

impl std::fmt::Debug for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Room")
            .field("id", &self.shared.id)
            .field("capacity", &self.shared.config.capacity)
            .field("status", &self.status())
            .finish()
    }
}

impl Room {
    pub(crate) fn new(
        id: RoomId,
        config: RoomConfig,
        registry: Option<Weak<RoomRegistry>>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(config.command_buffer);

        let mut seats = HashMap::with_capacity(config.capacity as usize);
        for n in 1..=config.capacity {
            seats.insert(SeatId(n), Seat::Vacant);
        }

        let shared = Arc::new(RoomShared {
            id,
            config,
            cmd_tx,
            status: AtomicU8::new(RoomStatus::Idle.as_u8()),
        });

        let worker = RoomWorker {
            shared: Arc::clone(&shared),
            seats,
            next_seat_hint: 1,
            cmd_rx,
            registry,
        };

        Self {
            shared,
            worker: Arc::new(Mutex::new(Some(worker))),
        }
    }

    /// Returns the room's opaque id.
    pub fn id(&self) -> &RoomId {
        &self.shared.id
    }

    /// Returns the room's fixed seat capacity.
    pub fn capacity(&self) -> u32 {
        self.shared.config.capacity
    }

    /// Returns the room's current lifecycle state.
    pub fn status(&self) -> RoomStatus {
        RoomStatus::from_u8(self.shared.status.load(Ordering::Acquire))
    }

    /// Runs the room's worker loop until the room stops.
    ///
    /// This is the long-lived serving call, not a request/response
    /// operation: it returns only on explicit [`stop`](Self::stop) or
    /// idle eviction. Fails with [`RoomError::AlreadyStarted`] if the
    /// room is already serving or has already stopped — a room instance
    /// serves at most once.
    pub async fn serve(&self) -> Result<(), RoomError> {
        let taken = self.worker.lock().await.take();
        let Some(mut worker) = taken else {
            return Err(RoomError::AlreadyStarted(self.shared.id.clone()));
        };

        self.shared
            .status
            .store(RoomStatus::Serving.as_u8(), Ordering::Release);
        tracing::info!(
            room_id = %self.shared.id,
            capacity = self.shared.config.capacity,
            "room serving"
        );

        worker.run().await;

        // The worker marks Stopped itself before replying to a stop;
        // storing again covers every other exit path.
        self.shared
            .status
            .store(RoomStatus::Stopped.as_u8(), Ordering::Release);
        tracing::info!(room_id = %self.shared.id, "room stopped");
        Ok(())
    }

    /// Requests termination. Idempotent: stopping a room that is not
    /// serving succeeds as a no-op.
    pub async fn stop(&self) -> Result<(), RoomError> {
        if !self.status().is_serving() {
            return Ok(());
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .shared
            .cmd_tx
            .send(RoomCommand::Stop { reply: reply_tx })
            .await
            .is_err()
        {
            // Worker exited between the status check and the send.
            return Ok(());
        }
        let _ = reply_rx.await;
        Ok(())
    }

    /// Claims the first vacant seat at or after the allocation hint.
    pub async fn claim_seat(&self) -> Result<SeatId, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.submit(RoomCommand::ClaimSeat { reply: reply_tx }, reply_rx)
            .await?
    }

    /// Binds `client` to `seat_id`, replacing any prior binding.
    pub async fn attach(
        &self,
        seat_id: SeatId,
        client: Box<dyn ClientStream>,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.submit(
            RoomCommand::Attach {
                seat_id,
                client,
                reply: reply_tx,
            },
            reply_rx,
        )
        .await?
    }

    /// Unbinds `seat_id`, making it vacant and preferred for the next
    /// claim if it sits below the allocation hint.
    pub async fn detach(&self, seat_id: SeatId) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.submit(
            RoomCommand::Detach {
                seat_id,
                reply: reply_tx,
            },
            reply_rx,
        )
        .await?
    }

    /// Delivers `payload` to every bound seat, the sender included.
    ///
    /// Individual write failures are logged and do not abort the
    /// fan-out; the last failure, if any, is returned as
    /// [`RoomError::BroadcastWrite`].
    pub async fn broadcast(
        &self,
        from: SeatId,
        payload: Bytes,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.submit(
            RoomCommand::Broadcast {
                from,
                payload,
                reply: reply_tx,
            },
            reply_rx,
        )
        .await?
    }

    /// Returns a snapshot of the room's occupancy.
    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.submit(RoomCommand::Info { reply: reply_tx }, reply_rx)
            .await
    }

    /// Submits a command and awaits its reply.
    ///
    /// The status check makes submission to a never-started or stopped
    /// room fail fast. The race against a concurrent stop resolves via
    /// the channels: a send or reply that fails because the worker is
    /// gone maps to `NotServing` as well.
    async fn submit<T>(
        &self,
        cmd: RoomCommand,
        reply_rx: oneshot::Receiver<T>,
    ) -> Result<T, RoomError> {
        if !self.status().is_serving() {
            return Err(RoomError::NotServing(self.shared.id.clone()));
        }
        self.shared
            .cmd_tx
            .send(cmd)
            .await
            .map_err(|_| RoomError::NotServing(self.shared.id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::NotServing(self.shared.id.clone()))
    }
}

/// The worker that owns the seat table. Runs inside `serve`.
struct RoomWorker {
    shared: Arc<RoomShared>,
    seats: HashMap<SeatId, Seat>,
    /// Advisory allocation cursor; claims scan from here.
    next_seat_hint: u32,
    cmd_rx: mpsc::Receiver<RoomCommand>,
    /// Used only to deregister on stop. The room does not own the
    /// registry's lifecycle.
    registry: Option<Weak<RoomRegistry>>,
}

impl RoomWorker {
    /// Processes commands until stopped or evicted for idleness.
    async fn run(&mut self) {
        let period = self.shared.config.idle_check_interval;
        let mut idle_check = time::interval_at(Instant::now() + period, period);

        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(RoomCommand::Stop { reply }) => {
                        self.shutdown().await;
                        let _ = reply.send(());
                        break;
                    }
                    Some(cmd) => self.handle(cmd),
                    None => {
                        // Every handle dropped; nothing can reach the
                        // room again.
                        self.shutdown().await;
                        break;
                    }
                },
                _ = idle_check.tick() => {
                    if self.occupied() == 0 {
                        tracing::info!(
                            room_id = %self.shared.id,
                            "room became inactive, stopping"
                        );
                        self.shutdown().await;
                        break;
                    }
                }
            }
        }
    }

    /// First effective stop: deregister, then mark stopped. Commands
    /// still queued behind the stop are dropped with the channel, which
    /// their callers observe as `NotServing`.
    async fn shutdown(&mut self) {
        if let Some(registry) = self.registry.take().and_then(|weak| weak.upgrade()) {
            registry.remove_by_id(self.shared.id.as_str()).await;
        }
        self.shared
            .status
            .store(RoomStatus::Stopped.as_u8(), Ordering::Release);
    }

    fn handle(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::ClaimSeat { reply } => {
                let _ = reply.send(self.claim_seat());
            }
            RoomCommand::Attach {
                seat_id,
                client,
                reply,
            } => {
                let _ = reply.send(self.attach(seat_id, client));
            }
            RoomCommand::Detach { seat_id, reply } => {
                let _ = reply.send(self.detach(seat_id));
            }
            RoomCommand::Broadcast {
                from,
                payload,
                reply,
            } => {
                let _ = reply.send(self.broadcast(from, payload));
            }
            RoomCommand::Info { reply } => {
                let _ = reply.send(self.info());
            }
            // Handled in `run` so shutdown can await.
            RoomCommand::Stop { reply } => {
                let _ = reply.send(());
            }
        }
    }

    fn claim_seat(&mut self) -> Result<SeatId, RoomError> {
        for n in self.next_seat_hint..=self.shared.config.capacity {
            let seat_id = SeatId(n);
            if self.seats[&seat_id].is_vacant() {
                self.seats.insert(seat_id, Seat::Claimed);
                self.next_seat_hint = n + 1;
                tracing::debug!(
                    room_id = %self.shared.id,
                    seat = %seat_id,
                    "seat claimed"
                );
                return Ok(seat_id);
            }
        }
        Err(RoomError::RoomFull(self.shared.id.clone()))
    }

    fn attach(
        &mut self,
        seat_id: SeatId,
        client: Box<dyn ClientStream>,
    ) -> Result<(), RoomError> {
        self.check_range(seat_id)?;
        let prior = self.seats.insert(seat_id, Seat::Bound(client));
        tracing::debug!(
            room_id = %self.shared.id,
            seat = %seat_id,
            rebound = matches!(prior, Some(Seat::Bound(_))),
            "client attached"
        );
        Ok(())
    }

    fn detach(&mut self, seat_id: SeatId) -> Result<(), RoomError> {
        self.check_range(seat_id)?;
        self.seats.insert(seat_id, Seat::Vacant);
        if seat_id.0 < self.next_seat_hint {
            self.next_seat_hint = seat_id.0;
        }
        tracing::debug!(
            room_id = %self.shared.id,
            seat = %seat_id,
            "client detached"
        );
        Ok(())
    }

    fn broadcast(&mut self, from: SeatId, payload: Bytes) -> Result<(), RoomError> {
        self.check_range(from)?;
        if !self.seats[&from].is_bound() {
            return Err(RoomError::SenderNotSeated {
                room: self.shared.id.clone(),
                seat: from,
            });
        }

        let mut last_failure: Option<(SeatId, std::io::Error)> = None;

        // Ascending seat order, sender included. A failed write never
        // aborts the fan-out.
        for n in 1..=self.shared.config.capacity {
            let seat_id = SeatId(n);
            if let Some(Seat::Bound(client)) = self.seats.get_mut(&seat_id) {
                match client.write(payload.clone()) {
                    Ok(_) => {}
                    Err(err) => {
                        tracing::warn!(
                            room_id = %self.shared.id,
                            seat = %seat_id,
                            error = %err,
                            "broadcast write failed"
                        );
                        last_failure = Some((seat_id, err));
                    }
                }
                client.flush();
            }
        }

        match last_failure {
            Some((seat, source)) => Err(RoomError::BroadcastWrite { seat, source }),
            None => Ok(()),
        }
    }

    fn check_range(&self, seat_id: SeatId) -> Result<(), RoomError> {
        if seat_id.0 < 1 || seat_id.0 > self.shared.config.capacity {
            return Err(RoomError::InvalidSeat {
                room: self.shared.id.clone(),
                seat: seat_id,
            });
        }
        Ok(())
    }

    /// Seats that are claimed or bound.
    fn occupied(&self) -> u32 {
        self.seats.values().filter(|seat| !seat.is_vacant()).count() as u32
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.shared.id.clone(),
            capacity: self.shared.config.capacity,
            occupied: self.occupied(),
        }
    }
}
