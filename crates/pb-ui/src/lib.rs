//! # pb-ui
//!
//! Askama templates and the view models they render. Views are built from a
//! borrowed `Session` and own all their data, so the session lock can be
//! released before rendering.

use askama::Template;
use chrono::DateTime;
use pb_core::autofill::UploadForm;
use pb_core::notice::NOTICE_MS;
use pb_core::{FeedMode, Language, Notice, Pin, QuickFilter, Session, CATEGORIES, TRENDING};
use serde::Serialize;

mod labels;

pub use labels::{labels, Labels};

/// One card in the masonry grid.
#[derive(Debug, Clone, Serialize)]
pub struct PinCardView {
    pub id: String,
    pub src: String,
    pub title: String,
    pub author: String,
    pub cat: String,
    pub liked: bool,
    pub like_count: u32,
    pub saved: bool,
    /// Height as a percentage of width, for the aspect-ratio box
    pub ratio: String,
}

impl PinCardView {
    fn build(pin: &Pin, session: &Session) -> Self {
        let state = session.interactions();
        Self {
            id: pin.id.clone(),
            src: pin.src.clone(),
            title: pin.title.clone(),
            author: pin.author.clone(),
            cat: pin.cat.clone(),
            liked: state.is_liked(&pin.id),
            like_count: state.like_count(&pin.id),
            saved: state.is_saved(&pin.id),
            ratio: aspect_ratio(pin.w, pin.h),
        }
    }
}

pub fn aspect_ratio(w: u32, h: u32) -> String {
    format!("{:.2}", f64::from(h.max(1)) / f64::from(w.max(1)) * 100.0)
}

pub fn format_timestamp(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct ChipView {
    pub value: String,
    pub label: String,
    pub active: bool,
}

#[derive(Debug, Clone)]
pub struct UploadView {
    pub title: String,
    pub desc: String,
    pub cat: String,
    pub tags: String,
    pub url: String,
    pub uploading: bool,
    pub analyzing: bool,
}

impl UploadView {
    fn build(form: &UploadForm, analyzing: bool) -> Self {
        Self {
            title: form.title.clone(),
            desc: form.desc.clone(),
            cat: form.cat.clone(),
            tags: form.tags.clone(),
            url: form.url.clone(),
            uploading: form.uploading,
            analyzing,
        }
    }
}

fn quick_label(t: &Labels, quick: QuickFilter) -> &'static str {
    match quick {
        QuickFilter::Saved => t.quick_saved,
        QuickFilter::Liked => t.quick_liked,
        QuickFilter::Recent => t.quick_recent,
    }
}

#[derive(Template)]
#[template(path = "board.html")]
pub struct BoardTemplate {
    pub t: &'static Labels,
    pub lang: &'static str,
    pub remote: bool,
    pub query: String,
    pub categories: Vec<ChipView>,
    pub quick: Vec<ChipView>,
    pub trending: Vec<&'static str>,
    pub pins: Vec<PinCardView>,
    pub notices: Vec<&'static str>,
    pub notice_ms: u64,
    pub user: Option<String>,
    pub upload: Option<UploadView>,
    pub category_options: Vec<&'static str>,
    pub autofill_enabled: bool,
}

impl BoardTemplate {
    pub fn build(session: &Session, notices: &[Notice], autofill_enabled: bool) -> Self {
        let lang = session.language();
        let t = labels(lang);
        let criteria = session.criteria();

        let categories = CATEGORIES
            .iter()
            .map(|c| ChipView {
                value: c.to_string(),
                label: c.to_string(),
                active: criteria.category.as_deref() == Some(*c),
            })
            .collect();
        let quick = QuickFilter::ALL
            .iter()
            .map(|q| ChipView {
                value: q.as_str().to_string(),
                label: quick_label(t, *q).to_string(),
                active: criteria.quick == Some(*q),
            })
            .collect();

        Self {
            t,
            lang: lang.code(),
            remote: session.mode() == FeedMode::Remote,
            query: criteria.query.clone(),
            categories,
            quick,
            trending: TRENDING.to_vec(),
            pins: session.visible().into_iter().map(|p| PinCardView::build(p, session)).collect(),
            notices: notices.iter().map(|n| n.message(lang)).collect(),
            notice_ms: NOTICE_MS,
            user: session.user().map(|u| u.handle().to_string()),
            upload: session.upload_form().map(|f| UploadView::build(f, session.autofill_loading())),
            category_options: CATEGORIES.to_vec(),
            autofill_enabled,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommentView {
    pub text: String,
    pub at: String,
}

#[derive(Template)]
#[template(path = "pin.html")]
pub struct PinTemplate {
    pub t: &'static Labels,
    pub lang: &'static str,
    pub card: PinCardView,
    pub desc: String,
    pub tags: Vec<String>,
    pub created: String,
    pub comments: Vec<CommentView>,
    pub notices: Vec<&'static str>,
    pub notice_ms: u64,
}

impl PinTemplate {
    /// `None` when the pin is not (or no longer) in the collection.
    pub fn build(session: &Session, pin_id: &str, notices: &[Notice]) -> Option<Self> {
        let pin = session.pin(pin_id)?;
        let lang = session.language();
        Some(Self {
            t: labels(lang),
            lang: lang.code(),
            card: PinCardView::build(pin, session),
            desc: pin.desc.clone(),
            tags: pin.tags.clone(),
            created: format_timestamp(pin.created_at),
            comments: session
                .comments(pin_id)
                .iter()
                .map(|c| CommentView { text: c.text.clone(), at: format_timestamp(c.at) })
                .collect(),
            notices: notices.iter().map(|n| n.message(lang)).collect(),
            notice_ms: NOTICE_MS,
        })
    }
}

/// Full-screen failure page with a reload action.
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub t: &'static Labels,
    pub lang: &'static str,
    pub message: String,
}

impl ErrorTemplate {
    pub fn new(lang: Language, message: impl Into<String>) -> Self {
        Self { t: labels(lang), lang: lang.code(), message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pb_core::{DemoGenerator, MemoryStore};

    fn session() -> Session {
        Session::demo(Box::new(MemoryStore::new()), DemoGenerator::seeded(9))
    }

    #[test]
    fn board_lists_visible_pins_and_active_chips() {
        let mut s = session();
        s.select_category(CATEGORIES[2]);
        let page = BoardTemplate::build(&s, &[], false);
        assert_eq!(page.pins.len(), s.visible().len());
        assert_eq!(page.categories.iter().filter(|c| c.active).count(), 1);
        assert!(page.quick.iter().all(|q| !q.active));

        let html = page.render().unwrap();
        assert!(html.contains("Pinboard"));
        assert!(html.contains("data-sentinel"));
    }

    #[test]
    fn notices_and_labels_follow_the_language() {
        let mut s = session();
        s.set_language(Language::En);
        let html = BoardTemplate::build(&s, &[Notice::Saved], false).render().unwrap();
        assert!(html.contains("Saved"));
        assert!(html.contains("lang=\"en\""));
        assert!(html.contains("title=\"Share\""));
        assert!(html.contains("Link copied"));

        s.set_language(Language::Es);
        let html = BoardTemplate::build(&s, &[], false).render().unwrap();
        assert!(html.contains("title=\"Descargar\""));
        assert!(html.contains("Enlace copiado"));
    }

    #[test]
    fn cards_offer_share_and_download_of_the_image() {
        let s = session();
        let id = s.pins()[0].id.clone();
        let html = BoardTemplate::build(&s, &[], false).render().unwrap();
        assert!(html.contains("data-share="));
        assert!(html.contains(" download "));
        assert!(html.contains("navigator.share"));
        assert!(html.contains("navigator.clipboard"));

        let detail = PinTemplate::build(&s, &id, &[]).unwrap().render().unwrap();
        assert!(detail.contains("Compartir"));
        assert!(detail.contains("Descargar"));
        assert!(detail.contains("navigator.share"));
    }

    #[test]
    fn upload_modal_renders_only_when_open() {
        let mut s = session();
        assert!(!BoardTemplate::build(&s, &[], true).render().unwrap().contains("id=\"upload-form\""));
        s.open_upload();
        assert!(BoardTemplate::build(&s, &[], true).render().unwrap().contains("id=\"upload-form\""));
    }

    #[test]
    fn pin_titles_are_escaped() {
        let mut s = session();
        s.open_upload();
        let draft = pb_core::PinDraft {
            title: "<script>x</script>".into(),
            url: Some("https://img/a".into()),
            ..Default::default()
        };
        let pin = s.publish_local(draft).unwrap();
        let html = PinTemplate::build(&s, &pin.id, &[]).unwrap().render().unwrap();
        assert!(!html.contains("<script>x</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn detail_shows_comments_and_missing_pins_are_none() {
        let mut s = session();
        let id = s.pins()[0].id.clone();
        s.add_comment(&id, "Precioso");
        let page = PinTemplate::build(&s, &id, &[]).unwrap();
        assert_eq!(page.comments.len(), 1);
        assert!(PinTemplate::build(&s, "missing", &[]).is_none());
    }

    #[test]
    fn error_page_offers_a_reload() {
        let html = ErrorTemplate::new(Language::Es, "boom").render().unwrap();
        assert!(html.contains("boom"));
        assert!(html.contains("location.reload()"));
    }

    #[test]
    fn ratio_guards_zero_width() {
        assert_eq!(aspect_ratio(600, 800), "133.33");
        assert_eq!(aspect_ratio(0, 1), "100.00");
    }
}
