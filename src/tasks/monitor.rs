// Toastwatch — Inference Build Control Loop
//
// Every SAMPLE_DELAY_MS: acquire -> standardize -> push -> infer -> decide,
// then write the cancel line and redraw.  A sensor fault skips the window
// update and inference; a classifier fault keeps the previous command.  In
// both cases the pin is still written and the screen shows the last known
// estimate.

use embedded_graphics::prelude::Point;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::config::{CANCEL_THRESHOLD_S, SAMPLE_DELAY_MS};
use crate::controller::{self, ActuatorCommand, CancelController};
use crate::drivers::display::Screen;
use crate::ei::{self, Classifier};
use crate::error::{ClassifierFault, SensorFault};
use crate::schedule::Ticker;
use crate::sensors::SensorSource;
use crate::standardize::{standardize, StandardizationParams};
use crate::window::Window;

const LABEL_POS: Point = Point::new(0, 0);
const ESTIMATE_POS: Point = Point::new(0, 16);
const STATUS_POS: Point = Point::new(0, 40);

/// What one sample tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    Predicted {
        time_to_burnt: f32,
        command: ActuatorCommand,
    },
    SensorFault(SensorFault),
    ClassifierFault(ClassifierFault),
}

pub struct ToastMonitor<S, C, A, T, D> {
    sensors: S,
    classifier: C,
    cancel_pin: A,
    toasting_pin: T,
    screen: D,

    params: StandardizationParams,
    window: Window,
    controller: CancelController,
    ticker: Ticker,
    last_estimate: Option<f32>,
}

impl<S, C, A, T, D> ToastMonitor<S, C, A, T, D>
where
    S: SensorSource,
    C: Classifier,
    A: OutputPin,
    T: InputPin,
    D: Screen,
{
    pub fn new(
        sensors: S,
        classifier: C,
        cancel_pin: A,
        toasting_pin: T,
        screen: D,
        params: StandardizationParams,
        now_ms: u32,
    ) -> Self {
        Self {
            sensors,
            classifier,
            cancel_pin,
            toasting_pin,
            screen,
            params,
            window: Window::new(),
            controller: CancelController::new(CANCEL_THRESHOLD_S),
            ticker: Ticker::new(SAMPLE_DELAY_MS, now_ms),
            last_estimate: None,
        }
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn controller(&self) -> &CancelController {
        &self.controller
    }

    /// Most recent successful estimate, shown on faulted ticks.
    pub fn last_estimate(&self) -> Option<f32> {
        self.last_estimate
    }

    /// Call every loop iteration; runs a tick once the sample period elapsed.
    pub fn poll(&mut self, now_ms: u32) -> Option<TickOutcome> {
        self.ticker.due(now_ms).then(|| self.tick())
    }

    /// One full sample tick, regardless of the clock.
    pub fn tick(&mut self) -> TickOutcome {
        let outcome = match self.sensors.acquire() {
            Err(fault) => {
                log::warn!("Sensor fault, skipping tick: {}", fault);
                TickOutcome::SensorFault(fault)
            }
            Ok(readings) => {
                self.window.push(&standardize(&readings.frame(), &self.params));
                self.predict()
            }
        };

        self.drive_cancel(self.controller.command());
        self.redraw();
        outcome
    }

    fn predict(&mut self) -> TickOutcome {
        let result = match ei::infer(&mut self.classifier, &self.window) {
            Ok(result) => result,
            Err(fault) => return TickOutcome::ClassifierFault(fault),
        };

        let time_to_burnt = result.time_to_burnt();
        let toasting = self.is_toasting();
        let command = self.controller.decide(time_to_burnt, toasting);
        self.last_estimate = Some(time_to_burnt);

        log::info!(
            "Time left: {:.1} s, toasting: {}, cancel: {}",
            time_to_burnt,
            toasting,
            command.is_asserted()
        );

        TickOutcome::Predicted { time_to_burnt, command }
    }

    fn is_toasting(&mut self) -> bool {
        self.toasting_pin.is_high().unwrap_or_else(|e| {
            log::warn!("Toasting sense read failed: {:?}", e);
            false
        })
    }

    fn drive_cancel(&mut self, command: ActuatorCommand) {
        if let Err(e) = controller::drive(&mut self.cancel_pin, command) {
            log::error!("Cancel pin write failed: {:?}", e);
        }
    }

    fn redraw(&mut self) {
        let estimate = match self.last_estimate {
            Some(t) => format!("{:.1} s", t),
            None => "--".to_owned(),
        };

        self.screen.clear();
        self.screen.render("Time left:", LABEL_POS);
        self.screen.render(&estimate, ESTIMATE_POS);
        self.screen.render(self.controller.status_text(), STATUS_POS);

        if let Err(e) = self.screen.present() {
            log::warn!("Display update failed: {}", e);
        }
    }
}
