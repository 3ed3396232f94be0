use actix::prelude::*;
use chrono::{DateTime, Days, FixedOffset, NaiveTime, Utc};
use std::sync::Arc;

use crate::clock::Clock;
use crate::domain::order::OrderError;
use crate::services::{CartManager, SweepReport};

// ============================================================================
// Cart Sweeper Actor - daily expiry of stale carts
// ============================================================================
//
// Fires once a day at a fixed local time, then re-arms itself for the next
// day. `SweepNow` runs a sweep immediately and returns its report.
//
// ============================================================================

/// Daily trigger time at the business location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSchedule {
    pub at: NaiveTime,
    pub offset: FixedOffset,
}

impl SweepSchedule {
    pub fn new(at: NaiveTime, offset: FixedOffset) -> Self {
        Self { at, offset }
    }

    /// Time left until the next trigger strictly after `now`
    pub fn delay_until_next(&self, now: DateTime<Utc>) -> std::time::Duration {
        let local_now = now.with_timezone(&self.offset).naive_local();
        let mut next = local_now.date().and_time(self.at);
        if next <= local_now {
            next = next.checked_add_days(Days::new(1)).unwrap_or(next);
        }
        (next - local_now).to_std().unwrap_or_default()
    }
}

// ============================================================================
// Messages
// ============================================================================

#[derive(Message)]
#[rtype(result = "Result<SweepReport, OrderError>")]
pub struct SweepNow;

// ============================================================================
// Actor
// ============================================================================

pub struct CartSweeper {
    carts: Arc<CartManager>,
    clock: Arc<dyn Clock>,
    schedule: SweepSchedule,
}

impl CartSweeper {
    pub fn new(carts: Arc<CartManager>, clock: Arc<dyn Clock>, schedule: SweepSchedule) -> Self {
        Self { carts, clock, schedule }
    }

    fn schedule_next(&self, ctx: &mut Context<Self>) {
        let delay = self.schedule.delay_until_next(self.clock.now());
        tracing::info!(delay_secs = delay.as_secs(), at = %self.schedule.at, "Next cart sweep scheduled");

        ctx.run_later(delay, |act, ctx| {
            let carts = act.carts.clone();
            ctx.spawn(
                async move {
                    if let Err(e) = carts.expire_stale_carts().await {
                        tracing::error!(error = %e, "Scheduled cart sweep failed");
                    }
                }
                .into_actor(act)
                .map(|_, act, ctx| act.schedule_next(ctx)),
            );
        });
    }
}

impl Actor for CartSweeper {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!("🧹 CartSweeper started");
        self.schedule_next(ctx);
    }

    fn stopped(&mut self, _: &mut Self::Context) {
        tracing::info!("🛑 CartSweeper stopped");
    }
}

// ============================================================================
// Message Handlers
// ============================================================================

impl Handler<SweepNow> for CartSweeper {
    type Result = ResponseFuture<Result<SweepReport, OrderError>>;

    fn handle(&mut self, _msg: SweepNow, _: &mut Self::Context) -> Self::Result {
        let carts = self.carts.clone();
        Box::pin(async move { carts.expire_stale_carts().await })
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
