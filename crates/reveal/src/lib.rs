//! One-shot loader/reveal timeline.
//!
//! The sequence is fixed at start-up: the loader bar grows to full width,
//! the loader fades out, then every panel is revealed in order with a
//! constant stagger. Sampling is a pure function of elapsed time so the
//! render loop simply asks for the frame that corresponds to "now".

use std::time::{Duration, Instant};

use sceneconfig::{Easing, RevealSettings, SceneConfig};
use serde::Serialize;

/// Immutable description of the reveal sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    bar_fill: Duration,
    loader_fade: Duration,
    duration: Duration,
    stagger: Duration,
    rise: f32,
    easing: Easing,
    bar_easing: Easing,
    panel_count: usize,
}

/// Loader and panel state at a given instant.
#[derive(Debug, Clone, PartialEq)]
pub struct RevealFrame {
    /// Loader bar width as a fraction of its full width.
    pub bar_progress: f32,
    pub loader_opacity: f32,
    pub loader_visible: bool,
    /// Set once the loader is gone; enables hover highlighting.
    pub loaded: bool,
    pub panels: Vec<PanelReveal>,
    pub finished: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelReveal {
    pub opacity: f32,
    /// Remaining downward offset in logical pixels.
    pub offset: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Keyframe {
    pub at_ms: u64,
    pub label: String,
}

impl Keyframe {
    fn new(at: Duration, label: impl Into<String>) -> Self {
        Self {
            at_ms: at.as_millis() as u64,
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Filling,
    Fading,
    Revealing,
    Finished,
}

impl Timeline {
    pub fn new(settings: &RevealSettings, panel_count: usize) -> Self {
        Self {
            bar_fill: settings.bar_fill,
            loader_fade: settings.loader_fade,
            duration: settings.duration,
            stagger: settings.stagger,
            rise: settings.rise,
            easing: settings.easing,
            bar_easing: settings.bar_easing,
            panel_count,
        }
    }

    pub fn from_config(config: &SceneConfig) -> Self {
        Self::new(&config.reveal, config.panels.len())
    }

    pub fn panel_count(&self) -> usize {
        self.panel_count
    }

    /// Instant (relative to start) at which the loader is removed.
    pub fn loader_hidden_at(&self) -> Duration {
        self.bar_fill.saturating_add(self.loader_fade)
    }

    pub fn panel_start(&self, index: usize) -> Duration {
        let steps = u32::try_from(index).unwrap_or(u32::MAX);
        self.loader_hidden_at()
            .saturating_add(self.stagger.saturating_mul(steps))
    }

    /// Length of the whole sequence, after which every sample is final.
    pub fn total(&self) -> Duration {
        match self.panel_count {
            0 => self.loader_hidden_at(),
            count => self.panel_start(count - 1).saturating_add(self.duration),
        }
    }

    pub fn phase(&self, elapsed: Duration) -> Phase {
        if elapsed >= self.total() {
            Phase::Finished
        } else if elapsed >= self.loader_hidden_at() {
            Phase::Revealing
        } else if elapsed >= self.bar_fill {
            Phase::Fading
        } else {
            Phase::Filling
        }
    }

    pub fn sample(&self, elapsed: Duration) -> RevealFrame {
        let bar_progress = self
            .bar_easing
            .sample(progress(elapsed, Duration::ZERO, self.bar_fill));
        let hidden_at = self.loader_hidden_at();
        let loader_visible = elapsed < hidden_at;
        let loader_opacity = if loader_visible {
            1.0 - progress(elapsed, self.bar_fill, self.loader_fade)
        } else {
            0.0
        };

        let panels = (0..self.panel_count)
            .map(|index| {
                let start = self.panel_start(index);
                if elapsed < start {
                    return PanelReveal {
                        opacity: 0.0,
                        offset: self.rise,
                    };
                }
                let eased = self
                    .easing
                    .sample(progress(elapsed, start, self.duration));
                PanelReveal {
                    opacity: eased,
                    offset: self.rise * (1.0 - eased),
                }
            })
            .collect();

        RevealFrame {
            bar_progress,
            loader_opacity,
            loader_visible,
            loaded: !loader_visible,
            panels,
            finished: elapsed >= self.total(),
        }
    }

    /// Final state of the sequence, as if it had already run to completion.
    pub fn finished_frame(&self) -> RevealFrame {
        self.sample(self.total())
    }

    /// Phase boundaries in chronological order.
    pub fn keyframes(&self) -> Vec<Keyframe> {
        let mut frames = vec![
            Keyframe::new(Duration::ZERO, "loader.bar.start"),
            Keyframe::new(self.bar_fill, "loader.bar.full"),
            Keyframe::new(self.bar_fill, "loader.fade.start"),
            Keyframe::new(self.loader_hidden_at(), "loader.hidden"),
        ];
        for index in 0..self.panel_count {
            let start = self.panel_start(index);
            frames.push(Keyframe::new(start, format!("panel[{index}].reveal.start")));
            frames.push(Keyframe::new(
                start.saturating_add(self.duration),
                format!("panel[{index}].reveal.end"),
            ));
        }
        frames.sort_by_key(|frame| frame.at_ms);
        frames
    }
}

/// Linear progress of `elapsed` through `[start, start + length]`, clamped.
fn progress(elapsed: Duration, start: Duration, length: Duration) -> f32 {
    if elapsed < start {
        return 0.0;
    }
    if length.is_zero() {
        return 1.0;
    }
    let local = elapsed - start;
    (local.as_secs_f32() / length.as_secs_f32()).clamp(0.0, 1.0)
}

/// Wall-clock driver for a [`Timeline`], started once.
#[derive(Debug, Clone)]
pub struct RevealSequencer {
    timeline: Timeline,
    started: Instant,
    skipped: bool,
    last_phase: Option<Phase>,
}

impl RevealSequencer {
    pub fn start(timeline: Timeline, now: Instant) -> Self {
        Self {
            timeline,
            started: now,
            skipped: false,
            last_phase: None,
        }
    }

    /// Jumps straight to the final state.
    pub fn skip(&mut self) {
        self.skipped = true;
    }

    pub fn frame(&mut self, now: Instant) -> RevealFrame {
        let elapsed = if self.skipped {
            self.timeline.total()
        } else {
            now.saturating_duration_since(self.started)
        };

        let phase = self.timeline.phase(elapsed);
        if self.last_phase != Some(phase) {
            tracing::debug!(?phase, elapsed_ms = elapsed.as_millis() as u64, "reveal phase");
            self.last_phase = Some(phase);
        }

        self.timeline.sample(elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn landing_timeline(panels: usize) -> Timeline {
        Timeline::new(&RevealSettings::default(), panels)
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn loader_bar_starts_empty() {
        let frame = landing_timeline(3).sample(Duration::ZERO);
        assert_eq!(frame.bar_progress, 0.0);
        assert_eq!(frame.loader_opacity, 1.0);
        assert!(frame.loader_visible);
        assert!(!frame.loaded);
        assert!(frame.panels.iter().all(|panel| panel.opacity == 0.0));
    }

    #[test]
    fn loader_bar_is_full_when_fade_begins() {
        let timeline = landing_timeline(3);
        let at_full = timeline.sample(ms(1200));
        assert!((at_full.bar_progress - 1.0).abs() < 1e-6);
        assert!((at_full.loader_opacity - 1.0).abs() < 1e-6);

        let fading = timeline.sample(ms(1700));
        assert!(fading.loader_opacity < 1.0);
        assert!((fading.loader_opacity - 0.5).abs() < 1e-3);
        assert!(fading.loader_visible);
        assert_eq!(timeline.phase(ms(1700)), Phase::Fading);
    }

    #[test]
    fn loader_hidden_and_reveal_staggered_after_fade() {
        let timeline = landing_timeline(3);
        let at_hidden = timeline.sample(ms(2200));
        assert!(!at_hidden.loader_visible);
        assert!(at_hidden.loaded);
        assert_eq!(at_hidden.loader_opacity, 0.0);
        assert_eq!(at_hidden.panels[0].opacity, 0.0);

        assert_eq!(timeline.panel_start(0), ms(2200));
        assert_eq!(timeline.panel_start(1), ms(2350));
        assert_eq!(timeline.panel_start(2), ms(2500));

        let mid = timeline.sample(ms(2400));
        assert!(mid.panels[0].opacity > mid.panels[1].opacity);
        assert!(mid.panels[1].opacity > 0.0);
        assert_eq!(mid.panels[2].opacity, 0.0);
        assert!((mid.panels[2].offset - 40.0).abs() < 1e-6);
    }

    #[test]
    fn panels_settle_fully_opaque_at_rest() {
        let timeline = landing_timeline(3);
        assert_eq!(timeline.total(), ms(2500 + 1200));
        let frame = timeline.sample(timeline.total());
        assert!(frame.finished);
        for panel in &frame.panels {
            assert!((panel.opacity - 1.0).abs() < 1e-6);
            assert!(panel.offset.abs() < 1e-4);
        }
        assert_eq!(timeline.phase(ms(10_000)), Phase::Finished);
    }

    #[test]
    fn panel_opacity_never_decreases() {
        let timeline = landing_timeline(2);
        let mut last = 0.0;
        for step in 0..=80 {
            let frame = timeline.sample(ms(step * 50));
            let opacity = frame.panels[1].opacity;
            assert!(opacity >= last - 1e-6);
            last = opacity;
        }
    }

    #[test]
    fn zero_length_phases_collapse() {
        let settings = RevealSettings {
            bar_fill: Duration::ZERO,
            loader_fade: Duration::ZERO,
            ..RevealSettings::default()
        };
        let timeline = Timeline::new(&settings, 1);
        let frame = timeline.sample(Duration::ZERO);
        assert_eq!(frame.bar_progress, 1.0);
        assert!(!frame.loader_visible);
        assert!(frame.loaded);
    }

    #[test]
    fn oversized_durations_saturate() {
        let settings = RevealSettings {
            bar_fill: Duration::MAX,
            loader_fade: Duration::MAX,
            stagger: Duration::MAX,
            ..RevealSettings::default()
        };
        let timeline = Timeline::new(&settings, 3);
        assert_eq!(timeline.loader_hidden_at(), Duration::MAX);
        assert_eq!(timeline.panel_start(2), Duration::MAX);
        assert_eq!(timeline.total(), Duration::MAX);

        let frame = timeline.sample(Duration::ZERO);
        assert!(frame.loader_visible);
        assert!(!frame.finished);
        assert_eq!(timeline.keyframes().len(), 4 + 3 * 2);
    }

    #[test]
    fn keyframes_are_chronological() {
        let frames = landing_timeline(2).keyframes();
        let labels: Vec<_> = frames.iter().map(|frame| frame.label.as_str()).collect();
        assert_eq!(labels[0], "loader.bar.start");
        assert!(labels.contains(&"loader.hidden"));
        assert!(frames.windows(2).all(|pair| pair[0].at_ms <= pair[1].at_ms));
        let hidden = frames
            .iter()
            .find(|frame| frame.label == "loader.hidden")
            .unwrap();
        assert_eq!(hidden.at_ms, 2200);
        let last = frames.last().unwrap();
        assert_eq!(last.label, "panel[1].reveal.end");
        assert_eq!(last.at_ms, 2350 + 1200);
    }

    #[test]
    fn sequencer_skip_jumps_to_final_frame() {
        let now = Instant::now();
        let mut sequencer = RevealSequencer::start(landing_timeline(3), now);
        assert!(sequencer.frame(now).loader_visible);
        sequencer.skip();
        let frame = sequencer.frame(now);
        assert!(frame.finished);
        assert!(frame.loaded);
    }

    #[test]
    fn sequencer_tracks_wall_clock() {
        let start = Instant::now();
        let mut sequencer = RevealSequencer::start(landing_timeline(1), start);
        let frame = sequencer.frame(start + ms(600));
        assert!((frame.bar_progress - 0.5).abs() < 1e-3);
    }
}
