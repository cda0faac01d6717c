use std::time::Duration;

use crate::{
    config::SiteConfig,
    dom::{Document, Element, Opacity, Propagation},
    error::Error,
    timer::Scheduler,
};

/// Trailing debounce over the shade's opacity: every pulse shows the shade
/// and pushes the pending hide back by `delay`.
pub struct ShadePulse<E, S: Scheduler> {
    shade: E,
    delay: Duration,
    scheduler: S,
    pending: Option<S::Handle>,
}

impl<E: Element, S: Scheduler> ShadePulse<E, S> {
    pub fn new(shade: E, delay: Duration, scheduler: S) -> Self {
        Self {
            shade,
            delay,
            scheduler,
            pending: None,
        }
    }

    pub fn pulse(&mut self) -> Result<(), Error> {
        self.shade.set_opacity(Opacity::Visible)?;

        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
        }

        let shade = self.shade.clone();
        let handle = self.scheduler.schedule(
            self.delay,
            Box::new(move || {
                if let Err(err) = shade.set_opacity(Opacity::Hidden) {
                    log::error!("failed to hide shade: {}", err);
                }
            }),
        )?;
        self.pending = Some(handle);
        Ok(())
    }
}

pub struct ScrollFeedback<S> {
    scrollable_class: String,
    shade_class: String,
    delay: Duration,
    scheduler: S,
}

impl<S: Scheduler> ScrollFeedback<S> {
    pub fn new(config: &SiteConfig, scheduler: S) -> Self {
        Self {
            scrollable_class: config.scrollable_class.clone(),
            shade_class: config.shade_class.clone(),
            delay: config.shade_delay(),
            scheduler,
        }
    }

    /// Stops wheel events inside scrollable regions from reaching the page
    /// level. Returns the number of regions found.
    pub fn isolate_scrollable_regions<D: Document>(&self, doc: &D) -> Result<usize, Error> {
        let regions = doc.query_class(&self.scrollable_class);
        for region in &regions {
            doc.on_wheel(region, Box::new(|| Propagation::Stop))?;
        }
        log::debug!(
            "isolated {} scrollable region(s) .{}",
            regions.len(),
            self.scrollable_class
        );
        Ok(regions.len())
    }

    /// Pulses the shade on every page-level wheel event. Returns `false` when
    /// the page has no shade (or no body) to work with.
    pub fn pulse_on_scroll<D: Document>(&self, doc: &D) -> Result<bool, Error> {
        let Some(shade) = doc.query_first(&self.shade_class) else {
            log::warn!("no .{} element, scroll feedback disabled", self.shade_class);
            return Ok(false);
        };
        let Some(body) = doc.body() else {
            log::warn!("no body, scroll feedback disabled");
            return Ok(false);
        };

        let mut pulse = ShadePulse::new(shade, self.delay, self.scheduler.clone());
        doc.on_wheel(
            &body,
            Box::new(move || {
                if let Err(err) = pulse.pulse() {
                    log::error!("failed to pulse shade: {}", err);
                }
                Propagation::Continue
            }),
        )?;
        Ok(true)
    }

    /// Sets up both behaviors once the document is ready.
    pub fn install<D: Document>(self, doc: &D) -> Result<(), Error> {
        doc.on_ready(Box::new({
            let doc = doc.clone();
            move || {
                if let Err(err) = self.isolate_scrollable_regions(&doc) {
                    log::error!("failed to isolate scrollable regions: {}", err);
                }
                match self.pulse_on_scroll(&doc) {
                    Ok(true) => log::info!("scroll feedback installed"),
                    Ok(false) => {}
                    Err(err) => log::error!("failed to install scroll feedback: {}", err),
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dom::{MemDocument, MemElement},
        timer::ManualScheduler,
    };

    const MS: Duration = Duration::from_millis(1);

    fn shade() -> (MemDocument, MemElement) {
        let doc = MemDocument::new("https://example.com/").unwrap();
        let shade = doc.append(&doc.body_element(), &["shade"]);
        (doc, shade)
    }

    #[test]
    fn single_pulse_hides_after_delay() {
        let (_doc, el) = shade();
        let scheduler = ManualScheduler::new();
        let mut pulse = ShadePulse::new(el.clone(), 200 * MS, scheduler.clone());

        pulse.pulse().unwrap();
        assert_eq!(el.opacity(), Some(Opacity::Visible));

        scheduler.advance(199 * MS);
        assert_eq!(el.opacity(), Some(Opacity::Visible));
        scheduler.advance(MS);
        assert_eq!(el.opacity(), Some(Opacity::Hidden));
        assert_eq!(el.opacity_log(), [Opacity::Visible, Opacity::Hidden]);
    }

    #[test]
    fn burst_collapses_into_one_hide() {
        let (_doc, el) = shade();
        let scheduler = ManualScheduler::new();
        let mut pulse = ShadePulse::new(el.clone(), 200 * MS, scheduler.clone());

        for _ in 0..5 {
            pulse.pulse().unwrap();
            // A new pulse always replaces the pending hide.
            assert_eq!(scheduler.pending(), 1);
            scheduler.advance(150 * MS);
            assert_eq!(el.opacity(), Some(Opacity::Visible));
        }
        // Last pulse at 600ms, so the hide is due at 800ms.
        assert_eq!(scheduler.now(), 750 * MS);
        assert_eq!(scheduler.pending(), 1);
        scheduler.advance(49 * MS);
        assert_eq!(el.opacity(), Some(Opacity::Visible));
        assert_eq!(scheduler.advance(MS), 1);

        let hides = el
            .opacity_log()
            .into_iter()
            .filter(|&opacity| opacity == Opacity::Hidden)
            .count();
        assert_eq!(hides, 1);
        assert_eq!(el.opacity(), Some(Opacity::Hidden));
    }

    #[test]
    fn pulse_after_hide_shows_again() {
        let (_doc, el) = shade();
        let scheduler = ManualScheduler::new();
        let mut pulse = ShadePulse::new(el.clone(), 200 * MS, scheduler.clone());

        pulse.pulse().unwrap();
        scheduler.advance(500 * MS);
        pulse.pulse().unwrap();
        assert_eq!(el.opacity(), Some(Opacity::Visible));
        scheduler.advance(200 * MS);
        assert_eq!(
            el.opacity_log(),
            [
                Opacity::Visible,
                Opacity::Hidden,
                Opacity::Visible,
                Opacity::Hidden
            ]
        );
    }

    #[test]
    fn missing_shade_is_a_no_op() {
        let doc = MemDocument::new("https://example.com/").unwrap();
        let feedback = ScrollFeedback::new(&SiteConfig::default(), ManualScheduler::new());
        assert!(!feedback.pulse_on_scroll(&doc).unwrap());
        assert_eq!(doc.dispatch_wheel(&doc.body_element()), 0);
    }

    #[test]
    fn no_scrollable_regions_is_a_no_op() {
        let (doc, _) = shade();
        let feedback = ScrollFeedback::new(&SiteConfig::default(), ManualScheduler::new());
        assert_eq!(feedback.isolate_scrollable_regions(&doc).unwrap(), 0);
    }
}
