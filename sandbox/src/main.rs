// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Cadence Sandbox
// Drives a few console "surfaces" through the process-wide scheduler, with
// the main thread playing the part of the toolkit's event thread.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use cadence_control::{Scheduler, SchedulerConfig, SchedulerEvent};
use cadence_core::{ChannelUiThread, FrameHandler, PaintError, RenderTarget, TaskPump};

const CONFIG: &str = r#"{ "target_fps": 30, "thread_name": "sandbox-render" }"#;

/// A surface that "draws" by advancing a frame counter.
struct ConsoleSurface {
    name: String,
    frames: AtomicU64,
    ignoring_repaint: AtomicBool,
}

impl ConsoleSurface {
    fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            frames: AtomicU64::new(0),
            ignoring_repaint: AtomicBool::new(false),
        })
    }
}

impl RenderTarget for ConsoleSurface {
    fn paint(&self) -> Result<(), PaintError> {
        let frame = self.frames.fetch_add(1, Ordering::Relaxed);
        log::trace!("[{}] frame {}", self.name, frame);
        Ok(())
    }

    fn is_displayable(&self) -> bool {
        true
    }

    fn set_ignore_repaint(&self, ignore: bool) {
        log::debug!("[{}] ignore toolkit repaints: {}", self.name, ignore);
        self.ignoring_repaint.store(ignore, Ordering::Relaxed);
    }

    fn label(&self) -> &str {
        &self.name
    }
}

/// A surface whose backend loses its device every tenth frame.
struct FlakySurface {
    frames: AtomicU64,
}

impl RenderTarget for FlakySurface {
    fn paint(&self) -> Result<(), PaintError> {
        let frame = self.frames.fetch_add(1, Ordering::Relaxed);
        if frame % 10 == 9 {
            return Err(PaintError::Backend(format!("device lost at frame {frame}")));
        }
        Ok(())
    }

    fn is_displayable(&self) -> bool {
        true
    }

    fn label(&self) -> &str {
        "flaky"
    }
}

/// Runs the toolkit side for `duration`: executes queued UI tasks and
/// reports scheduler events as they arrive.
fn pump_for(pump: &TaskPump, events: &flume::Receiver<SchedulerEvent>, duration: Duration) {
    let ticks = (duration.as_millis() / 50).max(1);
    for _ in 0..ticks {
        pump.run_for(Duration::from_millis(50));
        for event in events.try_iter() {
            match event {
                SchedulerEvent::PaintFailed { error, .. } => log::info!("Event: paint failed ({error})"),
                other => log::info!("Event: {:?}", other),
            }
        }
    }
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let (ui, pump) = ChannelUiThread::for_current_thread();
    let config = SchedulerConfig::from_json(CONFIG)?;
    let scheduler = Scheduler::builder()
        .config(config)
        .ui_thread(Arc::new(ui))
        .build()?;
    cadence_control::install_global(scheduler)
        .map_err(|_| anyhow!("a global scheduler was already installed"))?;

    let scheduler = cadence_control::global();
    let events = scheduler.events();

    let last_frame_ns = Arc::new(AtomicU64::new(0));
    let handler: Arc<dyn FrameHandler> = {
        let last_frame_ns = last_frame_ns.clone();
        Arc::new(move |elapsed_ns: u64| last_frame_ns.store(elapsed_ns, Ordering::Relaxed))
    };
    scheduler.add_frame_handler(&handler);

    let main_view = ConsoleSurface::new("main-view");
    let preview = ConsoleSurface::new("preview");
    let flaky: Arc<dyn RenderTarget> = Arc::new(FlakySurface {
        frames: AtomicU64::new(0),
    });
    let main_target: Arc<dyn RenderTarget> = main_view.clone();
    let preview_target: Arc<dyn RenderTarget> = preview.clone();

    scheduler.add_target(&main_target);
    scheduler.add_target(&preview_target);
    scheduler.add_target(&flaky);
    pump_for(&pump, &events, Duration::from_secs(2));

    log::info!(
        "After 2s at {} fps: main-view={} preview={} last interval={:.2}ms",
        scheduler.target_fps(),
        main_view.frames.load(Ordering::Relaxed),
        preview.frames.load(Ordering::Relaxed),
        last_frame_ns.load(Ordering::Relaxed) as f64 / 1e6,
    );

    scheduler.set_target_fps(60);
    scheduler.remove_target(&flaky);
    pump_for(&pump, &events, Duration::from_secs(2));

    let stats = scheduler.frame_stats();
    log::info!(
        "Stats: {} frames, {} paints, {} failures, {:.1} fps measured, jitter {:.2}ms",
        stats.frames,
        stats.paints,
        stats.paint_failures,
        stats.measured_fps(),
        stats.jitter_ms,
    );

    // Dropping a surface is enough: the loop prunes it and goes idle.
    scheduler.remove_target(&main_target);
    drop(preview_target);
    drop(preview);
    pump_for(&pump, &events, Duration::from_millis(500));

    log::info!(
        "Done: state={:?}, main-view ignores toolkit repaints: {}",
        scheduler.state(),
        main_view.ignoring_repaint.load(Ordering::Relaxed)
    );
    Ok(())
}
