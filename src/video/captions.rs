//! Caption timeline planning and ASS subtitle rendering.
//!
//! [`plan_captions`] turns a script and a target duration into a list of
//! timed [`CaptionEvent`]s; [`render_ass`] serialises that plan as an
//! Advanced SubStation Alpha script that ffmpeg's `ass` filter burns into the
//! video track.
//!
//! # Timeline rules
//!
//! ```text
//! Static      [0 ─────────────── caption ─────────────── D]
//!
//! WordByWord  [w1 | w2 | w3 | … | wn]      slot = max(D / n, 1 frame)
//!             [cta ░░ cta ░░ cta ░░ …]     period p, on for p × duty
//! ```
//!
//! Every event is clamped to `[0, D]`; events that would start at or after
//! `D` are dropped.  With zero words only the call-to-action track is
//! produced.

use crate::config::{CaptionStyle, VideoConfig};

// ---------------------------------------------------------------------------
// Plan types
// ---------------------------------------------------------------------------

/// Which ASS style an event is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionLayer {
    /// Regular caption text.
    Caption,
    /// The currently spoken word, drawn in the highlight colour.
    Highlight,
    /// Decorative blinking overlay near the bottom of the frame.
    CallToAction,
}

impl CaptionLayer {
    fn style_name(self) -> &'static str {
        match self {
            CaptionLayer::Caption => "Caption",
            CaptionLayer::Highlight => "Highlight",
            CaptionLayer::CallToAction => "CallToAction",
        }
    }
}

/// One timed piece of on-screen text.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionEvent {
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub layer: CaptionLayer,
}

/// All caption events for one render, bounded by `duration`.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionPlan {
    pub duration: f64,
    pub events: Vec<CaptionEvent>,
}

impl CaptionPlan {
    /// Latest end time across all events (0.0 for an empty plan).
    pub fn last_end(&self) -> f64 {
        self.events.iter().map(|e| e.end).fold(0.0, f64::max)
    }
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// Screen time of one word: `duration / word_count`, but never shorter than
/// one frame.  Returns `None` for zero words.
pub fn word_slot(word_count: usize, duration: f64, fps: u32) -> Option<f64> {
    if word_count == 0 {
        return None;
    }
    let frame = 1.0 / f64::from(fps.max(1));
    Some((duration / word_count as f64).max(frame))
}

/// Build the caption timeline for `text` over `duration` seconds.
pub fn plan_captions(text: &str, duration: f64, config: &VideoConfig) -> CaptionPlan {
    let duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
    let mut events = Vec::new();

    match config.caption_style {
        CaptionStyle::Static => {
            let caption = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if !caption.is_empty() && duration > 0.0 {
                events.push(CaptionEvent {
                    start: 0.0,
                    end: duration,
                    text: caption,
                    layer: CaptionLayer::Caption,
                });
            }
        }
        CaptionStyle::WordByWord => {
            let words: Vec<&str> = text.split_whitespace().collect();
            if let Some(slot) = word_slot(words.len(), duration, config.fps) {
                let layer = if config.highlight_active_word {
                    CaptionLayer::Highlight
                } else {
                    CaptionLayer::Caption
                };
                for (i, word) in words.iter().enumerate() {
                    let start = i as f64 * slot;
                    if start >= duration {
                        break;
                    }
                    events.push(CaptionEvent {
                        start,
                        end: (start + slot).min(duration),
                        text: (*word).to_string(),
                        layer,
                    });
                }
            }

            if let Some(cta) = config.call_to_action.as_deref().map(str::trim) {
                if !cta.is_empty() {
                    events.extend(blink_events(
                        cta,
                        duration,
                        config.cta_period_secs,
                        config.cta_duty_cycle,
                        config.fps,
                    ));
                }
            }
        }
    }

    CaptionPlan { duration, events }
}

/// On-intervals of a blinking overlay: on for `period × duty` at the start of
/// every period.  A non-positive period means always on; shorter periods are
/// raised to one frame.
fn blink_events(
    text: &str,
    duration: f64,
    period: f64,
    duty: f64,
    fps: u32,
) -> Vec<CaptionEvent> {
    let event = |start: f64, end: f64| CaptionEvent {
        start,
        end,
        text: text.to_string(),
        layer: CaptionLayer::CallToAction,
    };

    if duration <= 0.0 {
        return Vec::new();
    }
    if !(period.is_finite() && period > 0.0) {
        return vec![event(0.0, duration)];
    }
    let period = period.max(1.0 / f64::from(fps.max(1)));

    let duty = if duty.is_finite() { duty.clamp(0.0, 1.0) } else { 0.0 };
    if duty == 0.0 {
        return Vec::new();
    }
    let on = period * duty;

    let mut events = Vec::new();
    let mut k = 0u64;
    loop {
        let start = k as f64 * period;
        if start >= duration {
            break;
        }
        events.push(event(start, (start + on).min(duration)));
        k += 1;
    }
    events
}

// ---------------------------------------------------------------------------
// ASS rendering
// ---------------------------------------------------------------------------

/// `#RRGGBB` → ASS `&H00BBGGRR`.  Unparseable input falls back to white.
pub fn ass_color(hex: &str) -> String {
    let digits = hex.trim().trim_start_matches('#');
    let parsed = (digits.len() == 6)
        .then(|| u32::from_str_radix(digits, 16).ok())
        .flatten();

    match parsed {
        Some(rgb) => {
            let (r, g, b) = ((rgb >> 16) & 0xFF, (rgb >> 8) & 0xFF, rgb & 0xFF);
            format!("&H00{b:02X}{g:02X}{r:02X}")
        }
        None => "&H00FFFFFF".to_string(),
    }
}

/// Seconds → `H:MM:SS.cc`.
pub fn ass_timestamp(secs: f64) -> String {
    let cs = (secs.max(0.0) * 100.0).round() as u64;
    let (h, m, s, c) = (cs / 360_000, (cs / 6_000) % 60, (cs / 100) % 60, cs % 100);
    format!("{h}:{m:02}:{s:02}.{c:02}")
}

/// Braces open override blocks in ASS and newlines must be `\N`.  A literal
/// backslash gets a word joiner after it so `\N`, `\n` and `\h` in the
/// script stay visible text.
fn escape_ass_text(text: &str) -> String {
    text.replace('\\', "\\\u{2060}")
        .replace('{', "(")
        .replace('}', ")")
        .replace("\r\n", "\\N")
        .replace('\n', "\\N")
}

/// Serialise `plan` as a complete ASS script sized to the video frame.
pub fn render_ass(plan: &CaptionPlan, config: &VideoConfig) -> String {
    let text = ass_color(&config.text_color);
    let highlight = ass_color(&config.highlight_color);
    let outline = "&H00000000";
    let margin_x = (config.width / 27).max(10);
    let cta_margin_v = config.height / 10;
    let cta_size = (config.font_size * 2 / 3).max(1);

    let mut out = String::with_capacity(1024 + plan.events.len() * 96);
    out.push_str("[Script Info]\n");
    out.push_str("ScriptType: v4.00+\n");
    out.push_str(&format!("PlayResX: {}\n", config.width));
    out.push_str(&format!("PlayResY: {}\n", config.height));
    out.push_str("WrapStyle: 0\n");
    out.push_str("ScaledBorderAndShadow: yes\n\n");

    out.push_str("[V4+ Styles]\n");
    out.push_str(
        "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, \
         BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, \
         BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n",
    );
    let mut style = |name: &str, size: u32, colour: &str, alignment: u8, margin_v: u32| {
        out.push_str(&format!(
            "Style: {name},{font},{size},{colour},{colour},{outline},{outline},-1,0,0,0,100,100,0,0,1,3,0,{alignment},{margin_x},{margin_x},{margin_v},1\n",
            font = config.font,
        ));
    };
    style("Caption", config.font_size, &text, 5, 0);
    style("Highlight", config.font_size, &highlight, 5, 0);
    style("CallToAction", cta_size, &text, 2, cta_margin_v);

    out.push_str("\n[Events]\n");
    out.push_str("Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n");
    for event in &plan.events {
        out.push_str(&format!(
            "Dialogue: 0,{},{},{},,0,0,0,,{}\n",
            ass_timestamp(event.start),
            ass_timestamp(event.end),
            event.layer.style_name(),
            escape_ass_text(&event.text),
        ));
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn word_config() -> VideoConfig {
        VideoConfig {
            caption_style: CaptionStyle::WordByWord,
            call_to_action: None,
            ..VideoConfig::default()
        }
    }

    #[test]
    fn word_slot_divides_duration() {
        assert_eq!(word_slot(4, 2.0, 24), Some(0.5));
    }

    #[test]
    fn word_slot_is_at_least_one_frame() {
        let slot = word_slot(1000, 1.0, 25).unwrap();
        assert!((slot - 0.04).abs() < 1e-9);
    }

    #[test]
    fn word_slot_of_zero_words_is_none() {
        assert_eq!(word_slot(0, 3.0, 24), None);
    }

    #[test]
    fn static_caption_spans_full_duration() {
        let plan = plan_captions("Dogs  are\nthe best.", 4.5, &VideoConfig::default());
        assert_eq!(plan.events.len(), 1);
        assert_eq!(plan.events[0].text, "Dogs are the best.");
        assert_eq!((plan.events[0].start, plan.events[0].end), (0.0, 4.5));
    }

    #[test]
    fn static_caption_of_blank_text_is_empty() {
        let plan = plan_captions("   ", 4.5, &VideoConfig::default());
        assert!(plan.events.is_empty());
        assert_eq!(plan.duration, 4.5);
    }

    #[test]
    fn words_share_the_duration_evenly() {
        let plan = plan_captions("one two three four", 2.0, &word_config());
        let spans: Vec<(f64, f64)> = plan.events.iter().map(|e| (e.start, e.end)).collect();
        assert_eq!(spans, vec![(0.0, 0.5), (0.5, 1.0), (1.0, 1.5), (1.5, 2.0)]);
        assert!(plan.events.iter().all(|e| e.layer == CaptionLayer::Highlight));
    }

    #[test]
    fn highlight_can_be_disabled() {
        let mut config = word_config();
        config.highlight_active_word = false;
        let plan = plan_captions("one two", 1.0, &config);
        assert!(plan.events.iter().all(|e| e.layer == CaptionLayer::Caption));
    }

    #[test]
    fn dense_words_never_exceed_duration() {
        let text = vec!["w"; 500].join(" ");
        let mut config = word_config();
        config.fps = 25;
        let plan = plan_captions(&text, 1.0, &config);
        assert!(plan.last_end() <= 1.0);
        // 1 s at 25 fps fits 25 one-frame slots.
        assert_eq!(plan.events.len(), 25);
    }

    #[test]
    fn zero_words_with_cta_only_blinks() {
        let mut config = word_config();
        config.call_to_action = Some("Follow!".into());
        config.cta_period_secs = 1.0;
        config.cta_duty_cycle = 0.5;

        let plan = plan_captions("", 2.5, &config);
        let spans: Vec<(f64, f64)> = plan.events.iter().map(|e| (e.start, e.end)).collect();
        assert_eq!(spans, vec![(0.0, 0.5), (1.0, 1.5), (2.0, 2.5)]);
        assert!(plan.events.iter().all(|e| e.layer == CaptionLayer::CallToAction));
        assert_eq!(plan.duration, 2.5);
    }

    #[test]
    fn zero_words_without_cta_is_blank() {
        let plan = plan_captions("  ", 3.0, &word_config());
        assert!(plan.events.is_empty());
        assert_eq!(plan.duration, 3.0);
    }

    #[test]
    fn non_positive_period_keeps_cta_on() {
        let events = blink_events("cta", 3.0, 0.0, 0.5, 24);
        assert_eq!(events.len(), 1);
        assert_eq!((events[0].start, events[0].end), (0.0, 3.0));
    }

    #[test]
    fn zero_duty_hides_cta() {
        assert!(blink_events("cta", 3.0, 1.0, 0.0, 24).is_empty());
    }

    #[test]
    fn tiny_period_is_raised_to_one_frame() {
        let events = blink_events("cta", 2.0, 1e-9, 0.5, 25);
        assert_eq!(events.len(), 50);
        assert!((events[1].start - 0.04).abs() < 1e-9);
        assert!(events.iter().all(|e| e.end <= 2.0));
    }

    #[test]
    fn backslashes_do_not_become_override_codes() {
        let escaped = escape_ass_text("C:\\Notes\\new\nline");
        assert_eq!(escaped, "C:\\\u{2060}Notes\\\u{2060}new\\Nline");
        assert!(!escaped.contains("\\n"));
        assert_eq!(escape_ass_text("a\\Nb").matches("\\N").count(), 0);
    }

    #[test]
    fn ass_color_converts_to_bgr() {
        assert_eq!(ass_color("#FFD700"), "&H0000D7FF");
        assert_eq!(ass_color("not a colour"), "&H00FFFFFF");
    }

    #[test]
    fn ass_timestamp_formats_centiseconds() {
        assert_eq!(ass_timestamp(0.0), "0:00:00.00");
        assert_eq!(ass_timestamp(61.257), "0:01:01.26");
        assert_eq!(ass_timestamp(3_723.5), "1:02:03.50");
    }

    #[test]
    fn render_contains_styles_and_dialogue() {
        let mut config = word_config();
        config.call_to_action = Some("Like {and} subscribe".into());
        let plan = plan_captions("hello world", 1.0, &config);
        let ass = render_ass(&plan, &config);

        assert!(ass.contains("PlayResX: 1080"));
        assert!(ass.contains("PlayResY: 1920"));
        assert!(ass.contains("Style: Highlight,DejaVu Sans,72,&H0000D7FF"));
        assert!(ass.contains("Dialogue: 0,0:00:00.00,0:00:00.50,Highlight,,0,0,0,,hello"));
        assert!(ass.contains("Dialogue: 0,0:00:00.50,0:00:01.00,Highlight,,0,0,0,,world"));
        assert!(ass.contains("CallToAction,,0,0,0,,Like (and) subscribe"));
    }
}
