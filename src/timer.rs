//! Background process that counts the T register down while a program runs.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{select, tick, Sender};

use crate::config::Config;
use crate::console::Observer;
use crate::display::Display;
use crate::registers::Countdown;

/// The work done on each tick: count T down to 0 and render the display every
/// `render_every` ticks.
pub struct Ticker {
    countdown: Countdown,
    display: Arc<Display>,
    observer: Arc<dyn Observer>,
    render_every: u32,
    ticks: u32,
}

impl Ticker {
    pub fn new(
        countdown: Countdown,
        display: Arc<Display>,
        observer: Arc<dyn Observer>,
        render_every: u32,
    ) -> Self {
        Self {
            countdown,
            display,
            observer,
            render_every: render_every.max(1),
            ticks: 0,
        }
    }

    pub fn tick(&mut self) {
        self.countdown.decrement();

        self.ticks += 1;
        if self.ticks >= self.render_every {
            self.ticks = 0;
            log::debug!("Timer: T = {}", self.countdown.get());
            self.observer.screen(&self.display.render());
        }
    }
}

struct Worker {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

/// Runs a [`Ticker`] on its own thread. Starting a running timer and stopping
/// a stopped one do nothing.
pub struct Timer {
    countdown: Countdown,
    display: Arc<Display>,
    observer: Arc<dyn Observer>,
    period: Duration,
    render_every: u32,
    worker: Option<Worker>,
}

impl Timer {
    pub fn new(
        countdown: Countdown,
        display: Arc<Display>,
        observer: Arc<dyn Observer>,
        config: &Config,
    ) -> Self {
        Self {
            countdown,
            display,
            observer,
            period: config.timer_period,
            render_every: config.render_every,
            worker: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    pub fn start(&mut self) {
        if self.worker.is_some() {
            return;
        }

        let mut ticker = Ticker::new(
            self.countdown.clone(),
            Arc::clone(&self.display),
            Arc::clone(&self.observer),
            self.render_every,
        );
        let ticks = tick(self.period);
        let (stop, stopped) = crossbeam_channel::bounded::<()>(1);

        let handle = thread::spawn(move || loop {
            select! {
                recv(stopped) -> _ => break,
                recv(ticks) -> _ => ticker.tick(),
            }
        });

        log::debug!("timer started, period {:?}", self.period);
        self.worker = Some(Worker { stop, handle });
    }

    /// Stops the timer thread. A tick in progress finishes first; no further
    /// tick starts.
    pub fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop.send(());
            if worker.handle.join().is_err() {
                log::error!("timer thread panicked");
            }
            log::debug!("timer stopped");
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.stop();
    }
}
