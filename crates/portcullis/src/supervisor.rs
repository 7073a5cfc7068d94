//! Bounded-wait supervision of a join.
//!
//! A join may need several federation round-trips and can take far
//! longer than a client is willing to hold a request open. The
//! supervisor runs the join on its own Tokio task and races it against a
//! deadline:
//!
//! ```text
//!  caller ──supervise()──┬── spawn worker ── dispatch() ── tx.send(outcome)
//!                        │                                      │
//!                        └── select! { rx ◄─────────────────────┘
//!                                      sleep(deadline) }
//! ```
//!
//! The worker is detached. When the deadline wins, the caller returns
//! and the worker keeps going until the membership service answers.
//! Its result goes into a `oneshot` channel: one slot, written once, and
//! sending never blocks, even after the receiver is gone. Membership
//! changes can't be safely abandoned halfway, so nothing ever cancels
//! the worker.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use portcullis_protocol::JoinRequest;
use portcullis_room::{
    JoinOutcome, MembershipError, MembershipService, dispatch,
};
use tokio::sync::oneshot;
use tracing::Instrument;

/// What the waiting caller observed.
#[derive(Debug)]
pub enum SupervisedResult {
    /// The join finished before the deadline.
    Completed(JoinOutcome),
    /// The deadline passed first. The join is still running.
    DeadlineExceeded,
}

/// Runs joins on detached worker tasks and waits for them up to a
/// deadline.
///
/// ## Generic parameter
///
/// `M` is the membership backend. The supervisor is generic over it
/// rather than holding a `Box<dyn ...>` because [`MembershipService`]
/// returns `impl Future`, which isn't object safe. Every worker gets its
/// own `Arc<M>` clone, so the backend must be `Send + Sync + 'static`
/// (the trait already requires that) but does not need to be `Clone`.
///
/// ## Why `Clone` is implemented by hand
///
/// `#[derive(Clone)]` would add an `M: Clone` bound. Cloning a supervisor
/// only clones the two `Arc`s, so the manual impl below works for any
/// backend. Clones share the same `in_flight` counter.
///
/// ## Counting workers
///
/// `in_flight` goes up when a worker is spawned and down when it exits,
/// whether it returned or panicked. A caller that timed out still sees
/// its worker counted until the join actually settles.
pub struct JoinSupervisor<M> {
    membership: Arc<M>,
    deadline: Duration,
    in_flight: Arc<AtomicUsize>,
}

impl<M> Clone for JoinSupervisor<M> {
    fn clone(&self) -> Self {
        Self {
            membership: Arc::clone(&self.membership),
            deadline: self.deadline,
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<M: MembershipService> JoinSupervisor<M> {
    pub fn new(membership: Arc<M>, deadline: Duration) -> Self {
        Self {
            membership,
            deadline,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The configured deadline.
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Number of join workers that have not finished yet, including
    /// those whose callers stopped waiting.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Starts the join on a new task and waits for it, at most until the
    /// deadline.
    ///
    /// The request is moved into the worker. Exactly one worker is
    /// spawned per call, and it always runs to completion.
    pub async fn supervise(&self, request: JoinRequest) -> SupervisedResult {
        let (tx, rx) = oneshot::channel();
        let membership = Arc::clone(&self.membership);
        let guard = InFlightGuard::enter(Arc::clone(&self.in_flight));
        let span = tracing::info_span!(
            "join_worker",
            user_id = %request.user_id,
            room = %request.room_id_or_alias,
        );

        tokio::spawn(
            async move {
                let _guard = guard;
                let outcome = dispatch(membership.as_ref(), request).await;
                if let Err(outcome) = tx.send(outcome) {
                    record_deferred(&outcome);
                }
            }
            .instrument(span),
        );

        let result = await_outcome(rx, self.deadline).await;
        if matches!(result, SupervisedResult::DeadlineExceeded) {
            tracing::info!(
                deadline = ?self.deadline,
                "join still running at deadline, continuing in background"
            );
        }
        result
    }
}

/// Waits for the worker's outcome or the deadline, whichever comes first.
///
/// `biased` polls the channel first, so when both are ready the real
/// outcome wins over "still working".
async fn await_outcome(
    rx: oneshot::Receiver<JoinOutcome>,
    deadline: Duration,
) -> SupervisedResult {
    tokio::select! {
        biased;
        delivered = rx => match delivered {
            Ok(outcome) => SupervisedResult::Completed(outcome),
            // Sender dropped without a value: the worker panicked.
            Err(_) => SupervisedResult::Completed(
                JoinOutcome::TransportError(MembershipError::WorkerLost),
            ),
        },
        () = tokio::time::sleep(deadline) => SupervisedResult::DeadlineExceeded,
    }
}

/// Logs an outcome nobody was waiting for any more.
fn record_deferred(outcome: &JoinOutcome) {
    match outcome {
        JoinOutcome::Success { room_id } => {
            tracing::info!(%room_id, "background join completed");
        }
        JoinOutcome::DomainError(err) => {
            tracing::warn!(error = %err, "background join rejected");
        }
        JoinOutcome::TransportError(e) => {
            tracing::warn!(error = %e, "background join failed");
        }
    }
}

/// Counts a worker as in flight for as long as it lives. Dropped on
/// normal exit and on panic alike.
struct InFlightGuard(Arc<AtomicUsize>);

impl InFlightGuard {
    fn enter(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}
