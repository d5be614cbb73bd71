use printpdf::image_crate::DynamicImage;
use printpdf::{BuiltinFont, Image, ImageTransform, Mm, PdfDocument};

use crate::entities::participation_entity::Participation;

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN: f32 = 18.0;
const LINE_H: f32 = 6.0;

/// Decoded bitmap ready to embed into a dossier page.
pub struct RgbImageData {
    image: DynamicImage,
}

impl RgbImageData {
    pub fn from_encoded(bytes: &[u8]) -> Result<Self, String> {
        let image = printpdf::image_crate::load_from_memory(bytes)
            .map_err(|e| e.to_string())?;
        Ok(Self {
            image: DynamicImage::ImageRgb8(image.to_rgb8()),
        })
    }

    fn to_pdf_image(&self) -> Image {
        Image::from_dynamic_image(&self.image)
    }
}

/// Renders one candidacy into a fixed single-template PDF. The header and
/// signature bitmaps are optional; a missing one never fails the document.
pub fn render_participation(
    participation: &Participation,
    category_names: &[String],
    header: Option<&RgbImageData>,
    signature: Option<&RgbImageData>,
) -> Result<Vec<u8>, String> {
    let (doc, page, layer) = PdfDocument::new(
        format!("Candidature - {}", participation.establishment_name),
        Mm(PAGE_W),
        Mm(PAGE_H),
        "content",
    );
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| e.to_string())?;
    let font_bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| e.to_string())?;

    let mut current_page = page;
    let mut current_layer = doc.get_page(current_page).get_layer(layer);
    let mut y = PAGE_H - MARGIN;

    if let Some(header) = header {
        header.to_pdf_image().add_to_layer(
            current_layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(MARGIN)),
                translate_y: Some(Mm(PAGE_H - MARGIN - 20.0)),
                ..Default::default()
            },
        );
        y -= 26.0;
    }

    current_layer.use_text(
        format!("Candidature - {}", participation.establishment_name),
        16.0,
        Mm(MARGIN),
        Mm(y),
        &font_bold,
    );
    y -= 2.0 * LINE_H;

    let p = participation;
    let fields: Vec<(&str, String)> = vec![
        ("Candidat", format!("{} {}", p.candidate_first_name, p.candidate_surname)),
        ("Qualite", p.acting_capacity.clone()),
        ("Structure", p.structure_name.clone()),
        ("Enseigne", p.commercial_name.clone().unwrap_or_default()),
        ("SIRET", p.siret.clone()),
        ("Code NAF", p.naf_code.clone()),
        ("Email", p.email.clone()),
        ("Telephone", p.phone.clone().unwrap_or_default()),
        ("Categories", category_names.join(", ")),
        ("Activite", p.activity_description.clone().unwrap_or_default()),
        ("Clientele", p.clientele.clone().unwrap_or_default()),
        ("Produits", p.products.clone().unwrap_or_default()),
        ("Communication", p.communication_modes.clone().unwrap_or_default()),
        ("Forces / faiblesses", p.strengths_weaknesses.clone().unwrap_or_default()),
        ("Transition numerique", p.digital_transition.clone().unwrap_or_default()),
        ("Inclusion handicap", p.disability_inclusion.clone().unwrap_or_default()),
        ("Besoins handicap", p.disability_needs.clone().unwrap_or_default()),
        ("Taux handicap", p.disability_percentage.clone().unwrap_or_default()),
        ("Accompagnement", p.disability_support.clone().unwrap_or_default()),
        ("Motivations", p.participation_reasons.clone().unwrap_or_default()),
        ("Axes d'amelioration", p.improvement_axes.clone().unwrap_or_default()),
        ("Video", p.video_url.clone().unwrap_or_default()),
    ];

    for (label, value) in fields {
        if value.is_empty() {
            continue;
        }
        for (i, line) in wrap(&value, 82).into_iter().enumerate() {
            if y < MARGIN + 30.0 {
                let (new_page, new_layer) =
                    doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "content");
                current_page = new_page;
                current_layer = doc.get_page(current_page).get_layer(new_layer);
                y = PAGE_H - MARGIN;
            }
            if i == 0 {
                current_layer.use_text(format!("{label}:"), 10.0, Mm(MARGIN), Mm(y), &font_bold);
                current_layer.use_text(line, 10.0, Mm(MARGIN + 45.0), Mm(y), &font);
            } else {
                current_layer.use_text(line, 10.0, Mm(MARGIN + 45.0), Mm(y), &font);
            }
            y -= LINE_H;
        }
    }

    if let Some(signature) = signature {
        if y < MARGIN + 35.0 {
            let (new_page, new_layer) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "content");
            current_page = new_page;
            current_layer = doc.get_page(current_page).get_layer(new_layer);
            y = PAGE_H - MARGIN;
        }
        current_layer.use_text("Signature:", 10.0, Mm(MARGIN), Mm(y), &font_bold);
        signature.to_pdf_image().add_to_layer(
            current_layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(MARGIN)),
                translate_y: Some(Mm(y - 30.0)),
                ..Default::default()
            },
        );
    }

    doc.save_to_bytes().map_err(|e| e.to_string())
}

fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for raw_line in text.lines() {
        let mut current = String::new();
        for word in raw_line.split_whitespace() {
            if !current.is_empty() && current.len() + 1 + word.len() > max_chars {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
