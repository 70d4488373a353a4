//! Button resolver — raw presses → abstract commands in the queue.
//!
//! Group toggles are stateful: the first member's power state is sampled
//! once and the synthesized command is enqueued identically for every
//! member, so one resolution pass never produces mixed per-device commands.

use std::time::Duration;

use lumeq_domain::command::{AbstractCommand, NewCommand};
use lumeq_domain::device::PowerState;
use lumeq_domain::error::LumeqError;
use lumeq_domain::id::{DeviceId, GroupId};
use lumeq_domain::mapping::{ButtonMap, ButtonTarget};

use crate::ports::{ButtonEventRepository, CommandQueue, DeviceDirectory, GroupDirectory};

/// Tuning knobs for the resolver loop.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Maximum events fetched per cycle.
    pub fetch_limit: u32,
    /// Pause between cycles.
    pub poll_interval: Duration,
    /// Longer pause after a cycle-level error.
    pub error_backoff: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fetch_limit: 16,
            poll_interval: Duration::from_millis(250),
            error_backoff: Duration::from_secs(5),
        }
    }
}

/// Aggregate result of one `resolve_pending` call.
#[derive(Debug, Default)]
pub struct ResolveReport {
    /// Events seen in this pass (drained, skipped, or resolved).
    pub events: usize,
    /// Command records enqueued.
    pub enqueued: usize,
}

/// Consumes `received` button events and enqueues the commands they map to.
pub struct ButtonResolver<E, Q, D, G> {
    events: E,
    queue: Q,
    devices: D,
    groups: G,
    map: ButtonMap,
}

impl<E, Q, D, G> ButtonResolver<E, Q, D, G>
where
    E: ButtonEventRepository,
    Q: CommandQueue,
    D: DeviceDirectory,
    G: GroupDirectory,
{
    /// Create a resolver over the given ports and immutable button map.
    pub fn new(events: E, queue: Q, devices: D, groups: G, map: ButtonMap) -> Self {
        Self {
            events,
            queue,
            devices,
            groups,
            map,
        }
    }

    /// Resolve one batch of `received` events.
    ///
    /// Unmapped combinations are drained (`executed`, nothing enqueued).
    /// The `received → processing` compare-and-set guarantees at-most-one
    /// enqueue per event even with concurrent resolvers: losing the race is
    /// a silent skip.
    ///
    /// # Errors
    ///
    /// Returns [`LumeqError::Storage`] when a store round-trip fails.
    #[tracing::instrument(skip(self))]
    pub async fn resolve_pending(&self, limit: u32) -> Result<ResolveReport, LumeqError> {
        let pending = self.events.fetch_received(limit).await?;
        let mut report = ResolveReport {
            events: pending.len(),
            enqueued: 0,
        };

        for event in pending {
            let Some(target) = self.map.lookup(&event.remote_name, event.button_number) else {
                tracing::debug!(
                    remote = %event.remote_name,
                    button = event.button_number,
                    "no mapping for button, draining"
                );
                self.events.mark_executed(event.id).await?;
                continue;
            };

            if !self.events.try_claim(event.id).await? {
                tracing::debug!(event_id = event.id, "event already claimed, skipping");
                continue;
            }

            let enqueued = match target {
                ButtonTarget::Device { device, command } => {
                    self.resolve_device(device, *command).await?
                }
                ButtonTarget::Group { group, command } => {
                    self.resolve_group(*group, *command).await?
                }
            };
            report.enqueued += enqueued;

            self.events.mark_executed(event.id).await?;
        }

        Ok(report)
    }

    /// Poll forever: resolve, sleep, repeat; back off on cycle errors.
    pub async fn run(&self, config: ResolverConfig) {
        loop {
            match self.resolve_pending(config.fetch_limit).await {
                Ok(report) => {
                    if report.enqueued > 0 {
                        tracing::info!(
                            events = report.events,
                            enqueued = report.enqueued,
                            "resolver cycle finished"
                        );
                    }
                    tokio::time::sleep(config.poll_interval).await;
                }
                Err(err) => {
                    tracing::error!(error = %err, "resolver cycle failed, backing off");
                    tokio::time::sleep(config.error_backoff).await;
                }
            }
        }
    }

    async fn resolve_device(
        &self,
        device: &DeviceId,
        command: AbstractCommand,
    ) -> Result<usize, LumeqError> {
        let Some(entry) = self.devices.get_device(device).await? else {
            tracing::warn!(device = %device, "mapped device missing from directory, draining event");
            return Ok(0);
        };

        let command = match command {
            AbstractCommand::Toggle(brightness) => toggle_to_command(brightness, entry.power_state),
            concrete => concrete,
        };

        self.queue
            .enqueue(NewCommand {
                device: entry.device,
                model: entry.model,
                brand: entry.brand,
                command,
            })
            .await?;
        Ok(1)
    }

    async fn resolve_group(
        &self,
        group: GroupId,
        template: AbstractCommand,
    ) -> Result<usize, LumeqError> {
        let Some(members) = self.groups.get_group(group).await? else {
            tracing::warn!(group = %group, "mapped group missing from directory, draining event");
            return Ok(0);
        };

        // Synthesize once: every member gets the identical command, even if
        // members have desynchronized in the meantime.
        let command = match template {
            AbstractCommand::Toggle(brightness) => {
                let Some(first) = members.first_member() else {
                    tracing::warn!(group = %group, "group has no members, draining event");
                    return Ok(0);
                };
                let Some(sample) = self.devices.get_device(first).await? else {
                    tracing::warn!(
                        group = %group,
                        device = %first,
                        "sampled group member missing from directory, draining event"
                    );
                    return Ok(0);
                };
                toggle_to_command(brightness, sample.power_state)
            }
            concrete => concrete,
        };

        let mut enqueued = 0;
        for member in &members.devices {
            let Some(entry) = self.devices.get_device(member).await? else {
                tracing::warn!(device = %member, "group member missing from directory, skipping");
                continue;
            };
            self.queue
                .enqueue(NewCommand {
                    device: entry.device,
                    model: entry.model,
                    brand: entry.brand,
                    command,
                })
                .await?;
            enqueued += 1;
        }
        Ok(enqueued)
    }
}

/// Derive the concrete instruction for a toggle: "on" flips off, anything
/// else turns on via brightness (which implies power-on on every bridge).
fn toggle_to_command(brightness: i64, sampled: PowerState) -> AbstractCommand {
    if sampled.is_on() {
        AbstractCommand::Turn(PowerState::Off)
    } else {
        AbstractCommand::Brightness(brightness)
    }
}
