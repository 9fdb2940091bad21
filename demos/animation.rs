//! # Animation clock example
//!
//! Shows an external consumer driving sprite animations through an [`EventBus`].
//!
//! - `AnimationTick` is dispatched once per frame with the elapsed time.
//! - A pre-handler implements slow motion by scaling the elapsed time.
//! - The internal action advances the frame counter.
//! - A post-handler logs every frame change; a one-shot post-handler releases
//!   itself after the first loop completes.
//!
//! ## Run
//! ```bash
//! RUST_LOG=phasebus=debug cargo run --example animation
//! ```

use std::sync::{Arc, Mutex};

use phasebus::{Event, EventBus, SubscriptionHandle};
use tracing_subscriber::EnvFilter;

struct AnimationTick {
    elapsed: f64,
    frame_time: f64,
    accumulated: f64,
    frame: usize,
    frames: usize,
    looped: bool,
}

impl Event for AnimationTick {
    fn execute(&mut self, _bus: &EventBus) {
        self.accumulated += self.elapsed;
        self.looped = false;
        while self.accumulated >= self.frame_time {
            self.accumulated -= self.frame_time;
            self.frame += 1;
            if self.frame == self.frames {
                self.frame = 0;
                self.looped = true;
            }
        }
    }

    fn name() -> &'static str {
        "animation_tick"
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let bus = EventBus::builder().with_label("animation").build();

    let _slow_motion = bus.subscribe_before(|tick: &mut AnimationTick| tick.elapsed *= 0.5);

    let _printer = bus.subscribe_after(|tick: &AnimationTick| {
        println!(" ├─► frame {}/{}", tick.frame + 1, tick.frames);
    });

    let once: Arc<Mutex<Option<SubscriptionHandle>>> = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&once);
    let handle = bus.subscribe_after(move |tick: &AnimationTick| {
        if tick.looped {
            println!(" └─► first loop completed");
            if let Some(mut own) = slot.lock().ok().and_then(|mut s| s.take()) {
                own.release();
            }
        }
    });
    if let Ok(mut s) = once.lock() {
        *s = Some(handle);
    }

    let mut tick = AnimationTick {
        elapsed: 0.0,
        frame_time: 0.1,
        accumulated: 0.0,
        frame: 0,
        frames: 4,
        looped: false,
    };

    for _ in 0..20 {
        tick.elapsed = 0.1;
        bus.dispatch(&mut tick)?;
    }

    println!();
    println!("Handlers left: {:?}", bus.handler_count::<AnimationTick>());
    Ok(())
}
