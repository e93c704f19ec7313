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

use cadence_control::pacer::FramePacer;
use cadence_control::registry::{HandlerRegistry, TargetRegistry};
use cadence_core::{FrameHandler, PaintError, RenderTarget};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

struct Noop;

impl RenderTarget for Noop {
    fn paint(&self) -> Result<(), PaintError> {
        Ok(())
    }
    fn is_displayable(&self) -> bool {
        true
    }
}

fn bench_registries(c: &mut Criterion) {
    let targets = TargetRegistry::new();
    let keep: Vec<Arc<dyn RenderTarget>> = (0..64).map(|_| Arc::new(Noop) as _).collect();
    for target in &keep {
        targets.add(target);
    }
    let handlers = HandlerRegistry::new();
    let keep_handlers: Vec<Arc<dyn FrameHandler>> =
        (0..16).map(|_| Arc::new(|_: u64| {}) as _).collect();
    for handler in &keep_handlers {
        handlers.add(handler);
    }

    let mut group = c.benchmark_group("Registries");

    // What the render loop does every frame.
    group.bench_function("Frame walk (16 handlers, 64 targets)", |b| {
        b.iter(|| {
            for entry in handlers.snapshot().iter() {
                if let Some(handler) = entry.upgrade() {
                    handler.on_frame(black_box(33_333_333));
                }
            }
            let mut painted = 0;
            for entry in targets.snapshot().iter() {
                if let Some(target) = entry.upgrade() {
                    if target.is_displayable() && target.paint().is_ok() {
                        painted += 1;
                    }
                }
            }
            black_box(painted);
        });
    });

    // What a caller pays to register and unregister one target.
    let extra: Arc<dyn RenderTarget> = Arc::new(Noop);
    group.bench_function("Add + remove (64 targets)", |b| {
        b.iter(|| {
            black_box(targets.add(&extra));
            black_box(targets.remove(&extra));
        });
    });

    group.bench_function("Pacer plan", |b| {
        let mut pacer = FramePacer::default();
        b.iter(|| {
            pacer.observe_interval(black_box(60), black_box(Duration::from_micros(16_900)));
            black_box(pacer.plan(60, black_box(Duration::from_micros(2_500))))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_registries);
criterion_main!(benches);
