//! Subcommand implementations

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use firma_core::data_url::{measure_image, sniff_image_mime, DataUrl};
use firma_core::dates::DATE_FORMATS;
use firma_core::session::write_atomic;
use firma_core::{
    content_hash, export_file_name, export_pdf, page_boxes, FieldSeed, FieldStore,
    FileSessionStore, FontSource, HttpFontSource, OfflineFontSource, ScreenPoint, SessionStore,
};
use firma_types::{FieldType, PageView, SignatureKind, Size};

use crate::config::Config;

/// Shown for any failed export; details go to the log.
pub const EXPORT_FAILED: &str = "Something went wrong while creating your PDF";

/// An opened document with its persisted fields.
pub struct Session {
    path: PathBuf,
    bytes: Vec<u8>,
    hash: String,
    sessions: FileSessionStore,
    pub store: FieldStore,
}

impl Session {
    pub fn open(path: &Path, state_dir: &Path) -> anyhow::Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let hash = content_hash(&bytes);
        let sessions = FileSessionStore::new(state_dir);
        let store = match sessions.load(&hash)? {
            Some(state) => {
                tracing::debug!(%hash, fields = state.text_fields.len(), "Session restored");
                FieldStore::restore(state)
            }
            None => FieldStore::new(),
        };
        Ok(Self {
            path: path.to_path_buf(),
            bytes,
            hash,
            sessions,
            store,
        })
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Viewer state for `page` at `scale`, sized from the page's media box.
    pub fn view(&self, page: u32, scale: f64) -> anyhow::Result<PageView> {
        let boxes = page_boxes(&self.bytes)?;
        let (_, media_box) = boxes
            .iter()
            .find(|(number, _)| *number == page)
            .ok_or_else(|| anyhow!("{} has no page {}", self.path.display(), page))?;
        Ok(PageView::new(
            Size::new(media_box.width, media_box.height),
            scale,
            page,
        ))
    }

    pub fn save(&mut self) -> anyhow::Result<()> {
        self.store.deselect_all();
        let state = self.store.snapshot(
            &self.hash,
            &self.file_name(),
            chrono::Utc::now().timestamp_millis(),
        );
        self.sessions.save(&state)?;
        Ok(())
    }
}

/// Parse `x,y` in screen pixels.
pub fn parse_point(s: &str) -> Result<ScreenPoint, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got {:?}", s))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid coordinate {:?}: {}", v, e))
    };
    Ok(ScreenPoint {
        x: parse(x)?,
        y: parse(y)?,
    })
}

/// Zoom factor; must be positive.
pub fn parse_scale(s: &str) -> Result<f64, String> {
    let scale = s
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid scale {:?}: {}", s, e))?;
    if !scale.is_finite() || scale <= 0.0 {
        return Err(format!("scale must be positive, got {}", s));
    }
    Ok(scale)
}

/// Accepts a date format by label or pattern and returns the pattern.
pub fn parse_date_format(s: &str) -> Result<String, String> {
    DATE_FORMATS
        .iter()
        .find(|(label, pattern)| label.eq_ignore_ascii_case(s) || *pattern == s)
        .map(|(_, pattern)| pattern.to_string())
        .ok_or_else(|| {
            let labels: Vec<&str> = DATE_FORMATS.iter().map(|(label, _)| *label).collect();
            format!("unknown date format {:?} (expected one of {})", s, labels.join(", "))
        })
}

pub fn parse_field_type(s: &str) -> Result<FieldType, String> {
    FieldType::from_name(s).ok_or_else(|| {
        let names: Vec<&str> = FieldType::ALL.iter().map(|t| t.name()).collect();
        format!("unknown field type {:?} (expected one of {})", s, names.join(", "))
    })
}

pub fn parse_signature_kind(s: &str) -> Result<SignatureKind, String> {
    match s.to_ascii_lowercase().as_str() {
        "draw" => Ok(SignatureKind::Draw),
        "type" => Ok(SignatureKind::Type),
        "upload" => Ok(SignatureKind::Upload),
        other => Err(format!("unknown signature kind {:?}", other)),
    }
}

pub fn hash(pdf: &Path) -> anyhow::Result<()> {
    let bytes = std::fs::read(pdf).with_context(|| format!("Failed to read {}", pdf.display()))?;
    println!("{}", content_hash(&bytes));
    Ok(())
}

pub fn pages(pdf: &Path) -> anyhow::Result<()> {
    let bytes = std::fs::read(pdf).with_context(|| format!("Failed to read {}", pdf.display()))?;
    for (number, media_box) in page_boxes(&bytes)? {
        println!("{}\t{} x {}", number, media_box.width, media_box.height);
    }
    Ok(())
}

pub struct AddField {
    pub field_type: FieldType,
    pub page: u32,
    pub at: Option<ScreenPoint>,
    pub text: Option<String>,
    pub date_format: Option<String>,
    pub scale: f64,
}

pub fn add_field(
    config: &Config,
    state_dir: &Path,
    pdf: &Path,
    args: AddField,
) -> anyhow::Result<()> {
    let mut session = Session::open(pdf, state_dir)?;
    let view = session.view(args.page, args.scale)?;
    let mut defaults = config.defaults.clone();
    if let Some(date_format) = args.date_format {
        defaults.date_format = date_format;
    }
    let seed = FieldSeed {
        profile: &config.profile,
        defaults: &defaults,
        today: chrono::Local::now().date_naive(),
    };

    let id = session
        .store
        .add_text_field(args.field_type, &view, &seed)?
        .id
        .clone();
    if let Some(text) = args.text {
        session.store.update_text(&id, text)?;
    }
    if let Some(at) = args.at {
        if !session.store.update_position(&id, at, &view)? {
            bail!("Page is not loaded; field {} was not positioned", id);
        }
    }
    session.save()?;

    tracing::info!("{} field added", args.field_type.label());
    println!("{}", id);
    Ok(())
}

pub fn add_signature(state_dir: &Path, image: &Path, kind: SignatureKind) -> anyhow::Result<()> {
    let bytes =
        std::fs::read(image).with_context(|| format!("Failed to read {}", image.display()))?;
    let Some(mime) = sniff_image_mime(&bytes) else {
        bail!("{} is not a PNG or JPEG image", image.display());
    };

    let sessions = FileSessionStore::new(state_dir);
    let mut library = sessions.load_library()?;
    let id = library
        .create(kind, DataUrl::encode(mime, &bytes))
        .id
        .clone();
    sessions.save_library(&library)?;

    tracing::info!(%id, mime, "Signature saved");
    println!("{}", id);
    Ok(())
}

pub fn place_signature(
    state_dir: &Path,
    pdf: &Path,
    signature_id: &str,
    page: u32,
    at: Option<ScreenPoint>,
) -> anyhow::Result<()> {
    let mut session = Session::open(pdf, state_dir)?;
    let library = session.sessions.load_library()?;
    let view = session.view(page, 1.0)?;

    let placed = session.store.place_signature(signature_id, &library, &view)?;
    let id = placed.id.clone();
    let image = DataUrl::parse(&placed.data_url)?;
    let (width, height) = measure_image(&image.bytes)?;
    session
        .store
        .complete_signature_measurement(&id, width, height);
    if let Some(at) = at {
        if !session.store.update_signature_position(&id, at, &view)? {
            bail!("Page is not loaded; signature {} was not positioned", id);
        }
    }
    session.save()?;

    println!("{}", id);
    Ok(())
}

pub fn move_field(
    state_dir: &Path,
    pdf: &Path,
    id: &str,
    to: ScreenPoint,
    scale: f64,
) -> anyhow::Result<()> {
    let mut session = Session::open(pdf, state_dir)?;
    let text_page = session.store.text_field(id).map(|f| f.page);
    let signature_page = session.store.signature_field(id).map(|f| f.page);
    let moved = if let Some(page) = text_page {
        let view = session.view(page, scale)?;
        session.store.update_position(id, to, &view)?
    } else if let Some(page) = signature_page {
        let view = session.view(page, scale)?;
        session.store.update_signature_position(id, to, &view)?
    } else {
        bail!("No field with id {}", id);
    };
    if !moved {
        bail!("Page is not loaded; field {} was not moved", id);
    }
    session.save()
}

pub fn fields(state_dir: &Path, pdf: &Path) -> anyhow::Result<()> {
    let session = Session::open(pdf, state_dir)?;
    let json = serde_json::to_string_pretty(&session.store)?;
    println!("{}", json);
    Ok(())
}

/// Export path next to the input when none is given.
pub fn default_output(pdf: &Path) -> PathBuf {
    let name = pdf.file_name().map(|n| n.to_string_lossy().into_owned());
    pdf.with_file_name(export_file_name(name.as_deref()))
}

pub async fn export(
    config: &Config,
    state_dir: &Path,
    pdf: &Path,
    out: Option<PathBuf>,
    offline: bool,
) -> anyhow::Result<()> {
    let session = Session::open(pdf, state_dir)?;
    let font_source: Box<dyn FontSource> = if offline {
        Box::new(OfflineFontSource)
    } else {
        Box::new(HttpFontSource::new(config.fonts.clone())?)
    };

    let exported = match export_pdf(
        &session.bytes,
        session.store.text_fields(),
        session.store.signature_fields(),
        font_source.as_ref(),
        &config.export,
    )
    .await
    {
        Ok(exported) => exported,
        Err(e) => {
            tracing::error!(error = %e, pdf = %pdf.display(), "Export failed");
            bail!(EXPORT_FAILED);
        }
    };

    let out = out.unwrap_or_else(|| default_output(pdf));
    if let Err(e) = write_atomic(&out, &exported.bytes) {
        tracing::error!(error = %e, out = %out.display(), "Writing export failed");
        bail!(EXPORT_FAILED);
    }

    if exported.summary.fonts.fallback > 0 {
        tracing::warn!(
            fallback = exported.summary.fonts.fallback,
            "Some fonts were unavailable and were drawn with Helvetica"
        );
    }
    println!("{}", out.display());
    Ok(())
}
