// indicatif cannot draw to a non-tty, so there progress is logged instead
use {
    std::{io::IsTerminal, time::Instant},
    tracing::info,
    indicatif::{ProgressBar, ProgressStyle},
};

const LOG_INTERVAL_MILLIS: u128 = 10_000;

pub struct Progress {
    message: String,
    bar: ProgressBar,
    started_at: Instant,
    reported_at: Instant,
    total_processed: u64,
    total: u64,
}

impl Progress {
    pub fn new(message: String, total: u64) -> Self {
        let bar = if std::io::stderr().is_terminal() {
            let bar = ProgressBar::new(total);
            if let Ok(style) = ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len} ({per_sec}, eta {eta})") {
                bar.set_style(style);
            }
            bar.set_message(message.clone());
            bar
        } else {
            ProgressBar::hidden()
        };

        Self {
            message,
            bar,
            started_at: Instant::now(),
            reported_at: Instant::now(),
            total_processed: 0,
            total,
        }
    }

    pub fn update(&mut self) {
        self.total_processed += 1;
        self.bar.inc(1);

        let now = Instant::now();
        if self.bar.is_hidden() && (now - self.reported_at).as_millis() >= LOG_INTERVAL_MILLIS {
            self.reported_at = now;
            info!("{}: {}/{} ({:.2}/second)", self.message, self.total_processed, self.total, self.rate(now));
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
        info!("{}: finished {} in {:.1}s ({:.2}/second)",
            self.message, self.total_processed, self.started_at.elapsed().as_secs_f32(), self.rate(Instant::now()));
    }

    fn rate(&self, now: Instant) -> f32 {
        let elapsed = (now - self.started_at).as_secs_f32();
        if elapsed > 0.0 { self.total_processed as f32 / elapsed } else { 0.0 }
    }
}
