//! # pb-api Handlers
//!
//! Every handler locks the session for one synchronous transition and
//! releases it before awaiting a port. Form posts answer with a redirect;
//! the outcome travels as notices shown on the next render.

use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use askama::Template;
use pb_core::{
    AppError, AutofillOutcome, Credentials, ImagePayload, Language, MediaStore, MetadataGenerator,
    IdentityProvider, Notice, Pin, PinDraft, QuickFilter, SessionHandle, ViewportSample,
};
use pb_ui::{BoardTemplate, PinTemplate};
use serde::Deserialize;
use serde_json::json;

use crate::error::{ApiError, ApiResult};
use crate::multipart::read_fields;

/// State shared across all Actix-web workers.
pub struct AppState {
    pub session: SessionHandle,
    pub media: Option<Box<dyn MediaStore>>,
    pub identity: Option<Box<dyn IdentityProvider>>,
    pub metadata: Option<Box<dyn MetadataGenerator>>,
}

impl AppState {
    pub fn new(session: SessionHandle) -> Self {
        Self { session, media: None, identity: None, metadata: None }
    }

    fn lang(&self) -> Language {
        self.session.read(|s| s.language())
    }

    fn fail(&self, source: AppError) -> ApiError {
        ApiError::new(source, self.lang())
    }
}

fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther().insert_header((header::LOCATION, location)).finish()
}

/// Redirects to the referring page when it is a local path.
fn back(req: &HttpRequest) -> HttpResponse {
    let target = req
        .headers()
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .map(|referer| match referer.find("://") {
            Some(i) => referer[i + 3..].find('/').map(|j| &referer[i + 3 + j..]).unwrap_or("/"),
            None => referer,
        })
        .filter(|path| path.starts_with('/') && !path.starts_with("//"))
        .unwrap_or("/");
    see_other(target)
}

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok().content_type(header::ContentType::html()).body(body)
}

// --- Pages ---------------------------------------------------------------

/// Renders the board grid (e.g., /)
pub async fn board(data: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let autofill = data.metadata.is_some();
    let page = data.session.update(|s| {
        let notices = s.take_notices();
        BoardTemplate::build(s, &notices, autofill)
    });
    page.render().map(html).map_err(|e| ApiError::render(e, data.lang()))
}

/// Renders one pin with its comments (e.g., /pin/<id>)
pub async fn pin_detail(data: web::Data<AppState>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let page = data.session.update(|s| {
        let notices = s.take_notices();
        PinTemplate::build(s, &id, &notices)
    });
    match page {
        Some(page) => page.render().map(html).map_err(|e| ApiError::render(e, data.lang())),
        None => Err(data.fail(AppError::not_found("pin", id))),
    }
}

// --- Filters -------------------------------------------------------------

#[derive(Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub q: String,
}

pub async fn search(data: web::Data<AppState>, form: web::Form<SearchForm>) -> HttpResponse {
    data.session.update(|s| s.set_query(&form.q));
    see_other("/")
}

pub async fn filter_category(data: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    data.session.update(|s| s.select_category(&path));
    see_other("/")
}

pub async fn filter_quick(data: web::Data<AppState>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let quick: QuickFilter = path.parse().map_err(|e| data.fail(e))?;
    data.session.update(|s| s.select_quick(quick));
    Ok(see_other("/"))
}

pub async fn filter_clear(data: web::Data<AppState>) -> HttpResponse {
    data.session.update(|s| s.clear_filters());
    see_other("/")
}

// --- Interactions --------------------------------------------------------

pub async fn toggle_like(data: web::Data<AppState>, path: web::Path<String>, req: HttpRequest) -> HttpResponse {
    data.session.update(|s| s.toggle_like(&path));
    back(&req)
}

pub async fn toggle_save(data: web::Data<AppState>, path: web::Path<String>, req: HttpRequest) -> HttpResponse {
    data.session.update(|s| s.toggle_save(&path));
    back(&req)
}

#[derive(Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

pub async fn add_comment(
    data: web::Data<AppState>,
    path: web::Path<String>,
    form: web::Form<CommentForm>,
) -> HttpResponse {
    let id = path.into_inner();
    data.session.update(|s| s.add_comment(&id, &form.text));
    see_other(&format!("/pin/{id}"))
}

// --- Publishing ----------------------------------------------------------

pub async fn upload_open(data: web::Data<AppState>) -> HttpResponse {
    data.session.update(|s| s.open_upload());
    see_other("/")
}

pub async fn upload_close(data: web::Data<AppState>) -> HttpResponse {
    data.session.update(|s| s.close_upload());
    see_other("/")
}

/// Orchestrates a publish: store the file (if any), then hand the draft to
/// the session, which validates it and writes locally or remotely.
pub async fn upload_submit(data: web::Data<AppState>, payload: Multipart) -> ApiResult<HttpResponse> {
    let fields = read_fields(payload).await.map_err(|e| data.fail(e))?;

    let url = fields.text("url");
    let mut draft = PinDraft {
        title: fields.text("title"),
        desc: fields.text("desc"),
        cat: fields.text("cat"),
        tags: fields.text("tags"),
        url: Some(url.clone()).filter(|u| !u.is_empty()),
        image: None,
    };
    data.session.update(|s| {
        s.edit_upload(|form| {
            form.title = draft.title.clone();
            form.desc = draft.desc.clone();
            form.cat = draft.cat.clone();
            form.tags = draft.tags.clone();
            form.url = url;
        })
    });

    if let Some(file) = fields.file {
        match &data.media {
            Some(media) => match media.save_upload(file.bytes, &file.content_type).await {
                Ok(stored) => draft.image = Some(stored),
                Err(e) => {
                    tracing::warn!(error = %e, "upload could not be stored");
                    data.session.update(|s| s.notify(Notice::PublishFailed));
                    return Ok(see_other("/"));
                }
            },
            None => tracing::warn!("file upload ignored, no media store configured"),
        }
    }

    // Validation and remote failures are already reported as notices.
    if let Err(e) = data.session.publish(draft).await {
        tracing::debug!(error = %e, "publish did not complete");
    }
    Ok(see_other("/"))
}

/// Asks the metadata generator about the attached image and answers JSON
/// the upload form can apply in place.
pub async fn upload_autofill(data: web::Data<AppState>, payload: Multipart) -> ApiResult<HttpResponse> {
    let Some(generator) = &data.metadata else {
        return Ok(HttpResponse::Ok().json(json!({ "status": "disabled" })));
    };
    let fields = read_fields(payload).await.map_err(|e| data.fail(e))?;
    let Some(file) = fields.file else {
        return Err(data.fail(AppError::validation("an image is required")));
    };

    let image = ImagePayload { bytes: file.bytes, mime_type: file.content_type };
    let body = match data.session.autofill(generator.as_ref(), image).await {
        AutofillOutcome::Applied(meta) => json!({
            "status": "applied",
            "title": meta.title,
            "description": meta.description,
            "category": meta.category,
            "tags": meta.tags,
        }),
        AutofillOutcome::Stale => json!({ "status": "stale" }),
        AutofillOutcome::Failed(e) => json!({ "status": "failed", "error": e.to_string() }),
    };
    Ok(HttpResponse::Ok().json(body))
}

// --- Identity & language -------------------------------------------------

pub async fn login(data: web::Data<AppState>, form: web::Form<Credentials>) -> HttpResponse {
    match &data.identity {
        Some(provider) => {
            // Rejections are surfaced as a notice.
            let _ = data.session.sign_in(provider.as_ref(), form.into_inner()).await;
        }
        None => {
            tracing::warn!("sign-in attempted without an identity provider");
            data.session.update(|s| s.notify(Notice::LoginFailed));
        }
    }
    see_other("/")
}

pub async fn logout(data: web::Data<AppState>) -> HttpResponse {
    data.session.sign_out(data.identity.as_deref()).await;
    see_other("/")
}

pub async fn set_language(
    data: web::Data<AppState>,
    path: web::Path<String>,
    req: HttpRequest,
) -> ApiResult<HttpResponse> {
    let lang: Language = path.parse().map_err(|e| data.fail(e))?;
    data.session.update(|s| s.set_language(lang));
    Ok(back(&req))
}

// --- JSON ----------------------------------------------------------------

/// The filtered, ordered pins, as the grid shows them.
pub async fn api_pins(data: web::Data<AppState>) -> HttpResponse {
    let pins: Vec<Pin> = data.session.read(|s| s.visible().into_iter().cloned().collect());
    HttpResponse::Ok().json(pins)
}

/// Feeds one viewport sample to the infinite scroll controller.
pub async fn api_viewport(data: web::Data<AppState>, sample: web::Json<ViewportSample>) -> HttpResponse {
    let (appended, total) = data.session.update(|s| {
        let appended = s.on_viewport(sample.into_inner());
        (appended, s.pins().len())
    });
    HttpResponse::Ok().json(json!({ "appended": appended, "total": total }))
}

pub async fn not_found(data: web::Data<AppState>, req: HttpRequest) -> ApiResult<HttpResponse> {
    Err(data.fail(AppError::not_found("page", req.path())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn location(resp: &HttpResponse) -> &str {
        resp.headers().get(header::LOCATION).unwrap().to_str().unwrap()
    }

    #[test]
    fn back_follows_local_referers_only() {
        let req = TestRequest::default()
            .insert_header((header::REFERER, "http://localhost:8080/pin/abc"))
            .to_http_request();
        assert_eq!(location(&back(&req)), "/pin/abc");

        let req = TestRequest::default()
            .insert_header((header::REFERER, "//evil.example/x"))
            .to_http_request();
        assert_eq!(location(&back(&req)), "/");

        let req = TestRequest::default().to_http_request();
        assert_eq!(location(&back(&req)), "/");
    }
}
