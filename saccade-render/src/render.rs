use crate::figure::{Figure, Panel, PlotConfig, Series};
use ab_glyph::{Font, FontArc, Glyph, PxScale, ScaleFont, point};
use saccade_core::{Result, SaccadeError};
use std::collections::HashMap;
use std::fs;
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tiny_skia::{
    Color, FillRule, Paint, PathBuilder, Pixmap, PixmapPaint, PremultipliedColorU8, Rect, Stroke,
    Transform,
};
use tracing::{debug, warn};

const MARGIN_LEFT: f32 = 70.0;
const MARGIN_RIGHT: f32 = 20.0;
const MARGIN_TOP: f32 = 44.0;
const MARGIN_BOTTOM: f32 = 44.0;
const PANEL_GAP: f32 = 32.0;

const TITLE_PX: f32 = 20.0;
const LABEL_PX: f32 = 14.0;

static BUNDLED_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

struct TextCache {
    font: FontArc,
    map: HashMap<(String, u32), Arc<Pixmap>>,
}

impl TextCache {
    fn new(font: FontArc) -> Self {
        Self {
            font,
            map: HashMap::new(),
        }
    }

    fn get_or_render(&mut self, text: &str, size_px: f32) -> Option<Arc<Pixmap>> {
        let key = (text.to_string(), size_px.to_bits());
        if let Some(p) = self.map.get(&key) {
            return Some(Arc::clone(p));
        }
        let pm = Arc::new(render_text_pixmap(
            text,
            size_px,
            &self.font,
            Color::from_rgba8(30, 30, 30, 255),
        )?);
        self.map.insert(key, Arc::clone(&pm));
        Some(pm)
    }
}

/// Rasterises `text` into a tight transparent pixmap. `None` for blank text.
pub fn render_text_pixmap<F: Font>(
    text: &str,
    font_size: f32,
    font: &F,
    color: Color,
) -> Option<Pixmap> {
    let scale = PxScale::from(font_size);
    let sf = font.as_scaled(scale);

    // Layout with baseline at ascent
    let mut pen_x = 0.0f32;
    let mut glyphs = Vec::<Glyph>::new();
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = glyphs.last() {
            pen_x += sf.kern(prev.id, id);
        }
        glyphs.push(Glyph {
            id,
            scale,
            position: point(pen_x, sf.ascent()),
        });
        pen_x += sf.h_advance(id);
    }

    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for g in &glyphs {
        if let Some(out) = font.outline_glyph(g.clone()) {
            let b = out.px_bounds();
            min_x = min_x.min(b.min.x);
            min_y = min_y.min(b.min.y);
            max_x = max_x.max(b.max.x);
            max_y = max_y.max(b.max.y);
        }
    }
    if min_x == f32::INFINITY {
        return None;
    }

    let w = (max_x.ceil() - min_x.floor()).max(1.0) as u32;
    let h = (max_y.ceil() - min_y.floor()).max(1.0) as u32;
    let mut pm = Pixmap::new(w, h)?;
    let stride = pm.width() as usize;
    let dst = pm.pixels_mut();

    let cu = [
        (color.red() * 255.0) as u8,
        (color.green() * 255.0) as u8,
        (color.blue() * 255.0) as u8,
        (color.alpha() * 255.0) as u8,
    ];

    for g in &glyphs {
        if let Some(out) = font.outline_glyph(g.clone()) {
            let b = out.px_bounds();
            out.draw(|x, y, cov| {
                if cov <= f32::EPSILON {
                    return;
                }
                let ix = (x as f32 + b.min.x - min_x).floor() as i32;
                let iy = (y as f32 + b.min.y - min_y).floor() as i32;
                if ix < 0 || iy < 0 || ix >= w as i32 || iy >= h as i32 {
                    return;
                }
                let i = iy as usize * stride + ix as usize;

                // Premultiplied source-over
                let a = (cov * cu[3] as f32 / 255.0).clamp(0.0, 1.0);
                let bg = dst[i];
                let inv = 1.0 - a;
                let blend = |s: u8, d: u8| (s as f32 * a + d as f32 * inv).round().min(255.0) as u8;
                let out_a = blend(255, bg.alpha());
                let px = PremultipliedColorU8::from_rgba(
                    blend(cu[0], bg.red()).min(out_a),
                    blend(cu[1], bg.green()).min(out_a),
                    blend(cu[2], bg.blue()).min(out_a),
                    out_a,
                );
                if let Some(px) = px {
                    dst[i] = px;
                }
            });
        }
    }

    Some(pm)
}

/// Anything that can turn a figure into pixels
pub trait FigureRenderer {
    fn render(&mut self, figure: &Figure) -> Result<Pixmap>;
}

/// Maps sample index and value into a panel's pixel rectangle.
#[derive(Debug, Clone, Copy)]
pub struct Scale {
    pub area: Rect,
    pub samples: usize,
    pub y_min: f64,
    pub y_max: f64,
}

impl Scale {
    /// Flat ranges are widened by 0.5 each way, others padded by 5%.
    pub fn new(area: Rect, samples: usize, range: Option<(f64, f64)>) -> Self {
        let (lo, hi) = range.unwrap_or((0.0, 1.0));
        let (y_min, y_max) = if hi - lo < 1e-12 {
            (lo - 0.5, hi + 0.5)
        } else {
            let pad = (hi - lo) * 0.05;
            (lo - pad, hi + pad)
        };
        Self {
            area,
            samples,
            y_min,
            y_max,
        }
    }

    pub fn x(&self, index: usize) -> f32 {
        if self.samples <= 1 {
            return self.area.left() + self.area.width() / 2.0;
        }
        self.area.left() + self.area.width() * index as f32 / (self.samples - 1) as f32
    }

    pub fn y(&self, value: f64) -> f32 {
        let t = (value - self.y_min) / (self.y_max - self.y_min);
        self.area.bottom() - self.area.height() * t as f32
    }
}

/// Ranges of consecutive drawable samples; absent or non-finite samples split them.
pub fn segments(values: &[Option<f64>]) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    let mut start = None;
    for (i, v) in values.iter().enumerate() {
        let drawable = v.is_some_and(f64::is_finite);
        match (drawable, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                out.push(s..i);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        out.push(s..values.len());
    }
    out
}

/// Stacks panels top to bottom inside the figure margins.
pub fn panel_areas(width: u32, height: u32, count: usize) -> Result<Vec<Rect>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let plot_w = width as f32 - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = height as f32 - MARGIN_TOP - MARGIN_BOTTOM - PANEL_GAP * (count - 1) as f32;
    let panel_h = plot_h / count as f32;
    if plot_w < 10.0 || panel_h < 10.0 {
        return Err(SaccadeError::Render(format!(
            "{width}x{height} is too small for {count} panels"
        )));
    }
    (0..count)
        .map(|i| {
            let top = MARGIN_TOP + i as f32 * (panel_h + PANEL_GAP);
            Rect::from_xywh(MARGIN_LEFT, top, plot_w, panel_h)
                .ok_or_else(|| SaccadeError::Render("invalid panel geometry".to_string()))
        })
        .collect()
}

pub struct SkiaRenderer {
    text_cache: Option<TextCache>,
    background: Color,
    frame_color: Color,
}

impl Default for SkiaRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl SkiaRenderer {
    /// Renderer using the bundled DejaVu Sans for titles and labels.
    pub fn new() -> Self {
        match FontArc::try_from_slice(BUNDLED_FONT) {
            Ok(font) => Self {
                text_cache: Some(TextCache::new(font)),
                ..Self::without_text()
            },
            Err(e) => {
                warn!("Bundled font unusable, plot text is skipped: {e}");
                Self::without_text()
            }
        }
    }

    /// Only frames and series are drawn.
    pub fn without_text() -> Self {
        Self {
            text_cache: None,
            background: Color::WHITE,
            frame_color: Color::from_rgba8(90, 90, 90, 255),
        }
    }

    pub fn with_font_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(SaccadeError::not_found("font", path));
        }
        let font = FontArc::try_from_vec(fs::read(path)?)
            .map_err(|e| SaccadeError::Render(format!("invalid font {}: {e}", path.display())))?;
        Ok(Self {
            text_cache: Some(TextCache::new(font)),
            ..Self::without_text()
        })
    }

    pub fn from_config(config: &PlotConfig) -> Result<Self> {
        match &config.font_path {
            Some(path) => Self::with_font_file(path),
            None => Ok(Self::new()),
        }
    }

    pub fn has_text(&self) -> bool {
        self.text_cache.is_some()
    }

    fn draw_text(&mut self, canvas: &mut Pixmap, text: &str, size_px: f32, anchor: TextAnchor) {
        let Some(cache) = self.text_cache.as_mut() else {
            return;
        };
        let Some(pm) = cache.get_or_render(text, size_px) else {
            return;
        };
        let (w, h) = (pm.width() as f32, pm.height() as f32);
        let (x, y) = match anchor {
            TextAnchor::Center(cx, cy) => (cx - w / 2.0, cy - h / 2.0),
            TextAnchor::TopLeft(x, y) => (x, y),
            TextAnchor::TopRight(x, y) => (x - w, y),
            TextAnchor::BottomLeft(x, y) => (x, y - h),
            TextAnchor::MiddleRight(x, y) => (x - w, y - h / 2.0),
        };
        canvas.draw_pixmap(
            x.round() as i32,
            y.round() as i32,
            Pixmap::as_ref(&pm),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    fn draw_frame(&self, canvas: &mut Pixmap, area: Rect) {
        let mut paint = Paint::default();
        paint.set_color(self.frame_color);
        paint.anti_alias = false;
        let path = PathBuilder::from_rect(area);
        let stroke = Stroke {
            width: 1.0,
            ..Stroke::default()
        };
        canvas.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    fn draw_series(canvas: &mut Pixmap, series: &Series, scale: &Scale) {
        let mut paint = Paint::default();
        let [r, g, b, a] = series.color;
        paint.set_color_rgba8(r, g, b, a);
        paint.anti_alias = true;

        let mut pb = PathBuilder::new();
        for range in segments(&series.values) {
            let point = |i: usize| {
                // segments() only yields drawable samples
                let v = series.values[i].unwrap_or_default();
                (scale.x(i), scale.y(v))
            };
            if range.len() == 1 {
                let (x, y) = point(range.start);
                if let Some(dot) = PathBuilder::from_circle(x, y, series.width.max(1.0)) {
                    canvas.fill_path(&dot, &paint, FillRule::Winding, Transform::identity(), None);
                }
                continue;
            }
            let (x0, y0) = point(range.start);
            pb.move_to(x0, y0);
            for i in range.start + 1..range.end {
                let (x, y) = point(i);
                pb.line_to(x, y);
            }
        }

        if let Some(path) = pb.finish() {
            let stroke = Stroke {
                width: series.width,
                ..Stroke::default()
            };
            canvas.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }

    fn draw_panel(&mut self, canvas: &mut Pixmap, panel: &Panel, area: Rect, samples: usize) {
        let range = panel.value_range();
        let scale = Scale::new(area, samples, range);

        self.draw_frame(canvas, area);
        for series in &panel.series {
            Self::draw_series(canvas, series, &scale);
        }

        if let Some(label) = &panel.y_label {
            self.draw_text(
                canvas,
                label,
                LABEL_PX,
                TextAnchor::BottomLeft(area.left(), area.top() - 4.0),
            );
        }
        if let Some((lo, hi)) = range {
            self.draw_text(
                canvas,
                &format!("{hi:.2}"),
                LABEL_PX - 2.0,
                TextAnchor::MiddleRight(area.left() - 6.0, scale.y(hi)),
            );
            self.draw_text(
                canvas,
                &format!("{lo:.2}"),
                LABEL_PX - 2.0,
                TextAnchor::MiddleRight(area.left() - 6.0, scale.y(lo)),
            );
        }

        let mut legend_y = area.top() + 4.0;
        for series in &panel.series {
            if let Some(label) = &series.label {
                self.draw_text(
                    canvas,
                    label,
                    LABEL_PX,
                    TextAnchor::TopRight(area.right() - 6.0, legend_y),
                );
                legend_y += LABEL_PX + 4.0;
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum TextAnchor {
    Center(f32, f32),
    TopLeft(f32, f32),
    TopRight(f32, f32),
    BottomLeft(f32, f32),
    MiddleRight(f32, f32),
}

impl FigureRenderer for SkiaRenderer {
    fn render(&mut self, figure: &Figure) -> Result<Pixmap> {
        let started = Instant::now();
        let mut canvas = Pixmap::new(figure.width, figure.height).ok_or_else(|| {
            SaccadeError::Render(format!(
                "cannot allocate {}x{} canvas",
                figure.width, figure.height
            ))
        })?;
        canvas.fill(self.background);

        let areas = panel_areas(figure.width, figure.height, figure.panels.len())?;
        let samples = figure.sample_count();
        for (panel, area) in figure.panels.iter().zip(&areas) {
            self.draw_panel(&mut canvas, panel, *area, samples);
        }

        if let Some(title) = &figure.title {
            self.draw_text(
                &mut canvas,
                title,
                TITLE_PX,
                TextAnchor::Center(figure.width as f32 / 2.0, MARGIN_TOP / 2.0),
            );
        }
        if let (Some(label), Some(last)) = (&figure.x_label, areas.last()) {
            self.draw_text(
                &mut canvas,
                label,
                LABEL_PX,
                TextAnchor::Center(
                    last.left() + last.width() / 2.0,
                    last.bottom() + MARGIN_BOTTOM / 2.0,
                ),
            );
            self.draw_text(
                &mut canvas,
                &samples.saturating_sub(1).to_string(),
                LABEL_PX - 2.0,
                TextAnchor::TopRight(last.right(), last.bottom() + 4.0),
            );
            self.draw_text(
                &mut canvas,
                "0",
                LABEL_PX - 2.0,
                TextAnchor::TopLeft(last.left(), last.bottom() + 4.0),
            );
        }

        debug!(
            "Rendered {} panels, {} samples in {:.3} ms",
            figure.panels.len(),
            samples,
            started.elapsed().as_secs_f64() * 1e3
        );
        Ok(canvas)
    }
}

/// Writes the pixmap as PNG, creating the parent directory.
pub fn save_png(pixmap: &Pixmap, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating output directory {}", parent.display());
            fs::create_dir_all(parent)?;
        }
    }
    pixmap
        .save_png(path)
        .map_err(|e| SaccadeError::Render(format!("failed to write {}: {e}", path.display())))
}
