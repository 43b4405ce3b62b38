use futures::{
    channel::mpsc::{channel, Receiver, Sender},
    pin_mut,
    prelude::*,
    select,
};
use log::{debug, error};
use std::fmt;

#[derive(Debug, Clone)]
pub enum DeathReason {
    Killed(String),
    Terminated,
}

impl fmt::Display for DeathReason {
    fn fmt(&self, w: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeathReason::Killed(reason) => write!(w, "Killed ({})", reason),
            DeathReason::Terminated => write!(w, "Terminated due to external signal"),
        }
    }
}

#[derive(Debug)]
enum HeartInteraction {
    Kill(String),
}

/// Keeps a service process alive until it is killed or terminated
///
/// The [`death`](Heart::death) future resolves once a [`HeartStone`] requests
/// a kill or the process receives SIGTERM / ctrl-c.
pub struct Heart {
    rx: Receiver<HeartInteraction>,
}

impl Heart {
    pub fn new() -> (Self, HeartStone) {
        let (tx, rx) = channel(2);

        (Self { rx }, HeartStone::new(tx))
    }

    pub async fn death(&mut self) -> DeathReason {
        debug!("Heart starts beating");

        let termination = Heart::termination_signal().fuse();
        pin_mut!(termination);

        loop {
            select! {
                interaction = self.rx.next() => {
                    if let Some(HeartInteraction::Kill(reason)) = interaction {
                        return DeathReason::Killed(reason);
                    }
                },
                () = termination => return DeathReason::Terminated,
            };
        }
    }

    #[cfg(unix)]
    async fn termination_signal() {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm_stream =
            signal(SignalKind::terminate()).expect("unable to install SIGTERM handler");
        let sigterm = sigterm_stream.recv().fuse();
        let ctrl_c = tokio::signal::ctrl_c().fuse();

        pin_mut!(sigterm, ctrl_c);

        select! {
            _ = sigterm => (),
            _ = ctrl_c => (),
        };
    }

    #[cfg(not(unix))]
    async fn termination_signal() {
        tokio::signal::ctrl_c().await.ok();
    }
}

/// Remote control to stop a [`Heart`]
#[derive(Clone)]
pub struct HeartStone {
    remote: Sender<HeartInteraction>,
}

impl HeartStone {
    fn new(remote: Sender<HeartInteraction>) -> Self {
        Self { remote }
    }

    pub async fn kill(&mut self, reason: String) {
        self.send(HeartInteraction::Kill(reason)).await;
    }

    async fn send(&mut self, interaction: HeartInteraction) {
        if let Err(e) = self.remote.send(interaction).await {
            error!("Failed to interact with Heart: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::poll;
    use std::time::Duration;
    use tokio::task::{spawn, yield_now};
    use tokio::time::sleep;

    #[tokio::test]
    async fn lives_until_interacted_with() {
        let (mut heart, _stone) = Heart::new();

        let handle = spawn(async move { heart.death().await });
        sleep(Duration::from_millis(100)).await;
        yield_now().await;

        assert!(!poll!(handle).is_ready());
    }

    #[tokio::test]
    async fn dies_when_killed() {
        let (mut heart, mut stone) = Heart::new();

        let handle = spawn(async move { heart.death().await });
        stone.kill("Testing".to_owned()).await;
        yield_now().await;

        assert!(poll!(handle).is_ready());
    }
}
