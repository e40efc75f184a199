use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use lumina_core::{FormInput, MemoryClipboard, Studio, EDIT_FAILED_MESSAGE};
use lumina_gateway::ConceptGateway;
use lumina_schema::{Concept, ImageData, RequestState, DEFAULT_IMAGE_MIME};

fn studio(gateway: Arc<dyn ConceptGateway>) -> Studio {
    Studio::new(gateway, Arc::new(MemoryClipboard::new()))
}

/// `--index` is 1-based, matching the card numbers in the studio.
fn card_index(index: usize, count: usize) -> Result<usize> {
    match index.checked_sub(1) {
        Some(i) if i < count => Ok(i),
        _ => bail!("index {index} is out of range (1..={count})"),
    }
}

pub fn read_concepts(path: &Path) -> Result<Vec<Concept>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read concepts file: {}", path.display()))?;
    let concepts: Vec<Concept> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse concepts file: {}", path.display()))?;
    for concept in &concepts {
        concept.validate()?;
    }
    Ok(concepts)
}

pub fn write_concepts(path: &Path, concepts: &[Concept]) -> Result<()> {
    let json = serde_json::to_string_pretty(concepts)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write concepts file: {}", path.display()))
}

pub async fn generate(
    gateway: Arc<dyn ConceptGateway>,
    business_name: &str,
    industry: &str,
    style: &str,
) -> Result<Vec<Concept>> {
    let mut studio = studio(gateway);
    if !studio.submit(&FormInput::new(business_name, industry, style)) {
        bail!("business name and industry are required");
    }
    studio.settle().await;

    if studio.form().state() == RequestState::Failed {
        let error = studio.form().error().unwrap_or("concept generation failed");
        bail!("{error}");
    }
    Ok(studio.concepts().to_vec())
}

/// Refines one concept of a concepts file in place and returns the replacement.
pub async fn refine(
    gateway: Arc<dyn ConceptGateway>,
    concepts_path: &Path,
    index: usize,
    feedback: &str,
) -> Result<Concept> {
    let concepts = read_concepts(concepts_path)?;
    let index = card_index(index, concepts.len())?;

    let mut studio = studio(gateway);
    studio.load_concepts(concepts);
    if !studio.refine_text(index, feedback) {
        bail!("feedback must not be empty");
    }
    studio.settle().await;

    if let Some(error) = studio.card(index).and_then(|card| card.error()) {
        bail!("{error}");
    }
    write_concepts(concepts_path, studio.concepts())?;
    studio
        .concepts()
        .get(index)
        .cloned()
        .ok_or_else(|| anyhow!("concept {index} disappeared"))
}

/// Generates the image for one concept and saves it under `out_dir`.
pub async fn visualize(
    gateway: Arc<dyn ConceptGateway>,
    concepts_path: &Path,
    index: usize,
    out_dir: &Path,
) -> Result<PathBuf> {
    let concepts = read_concepts(concepts_path)?;
    let index = card_index(index, concepts.len())?;

    let mut studio = studio(gateway);
    studio.load_concepts(concepts);
    studio.generate_image(index);
    studio.settle().await;

    if let Some(error) = studio.card(index).and_then(|card| card.error()) {
        bail!("{error}");
    }
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output dir: {}", out_dir.display()))?;
    studio.save_image(index, out_dir)
}

pub async fn edit_image(
    gateway: Arc<dyn ConceptGateway>,
    image_path: &Path,
    instruction: &str,
    out: &Path,
) -> Result<()> {
    let instruction = instruction.trim();
    if instruction.is_empty() {
        bail!("instruction must not be empty");
    }
    let bytes = std::fs::read(image_path)
        .with_context(|| format!("failed to read image: {}", image_path.display()))?;
    let image = ImageData::from_bytes(mime_for_path(image_path), &bytes);

    let edited = gateway
        .edit_image(&image, instruction)
        .await
        .with_context(|| EDIT_FAILED_MESSAGE)?;
    std::fs::write(out, edited.decode()?)
        .with_context(|| format!("failed to write image: {}", out.display()))?;
    tracing::info!(out = %out.display(), mime = %edited.mime_type, "edited image saved");
    Ok(())
}

/// Image MIME type from the file extension; unknown types are sent as PNG.
pub fn mime_for_path(path: &Path) -> String {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if mime.type_() == mime_guess::mime::IMAGE {
        mime.essence_str().to_string()
    } else {
        DEFAULT_IMAGE_MIME.to_string()
    }
}

pub fn format_concept(number: usize, concept: &Concept) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{number}. {}", concept.name);
    let _ = writeln!(out, "   Meaning: {}", concept.rationale);
    let _ = writeln!(out, "   Visual:  {}", concept.visual_description);
    let palette: Vec<String> = concept
        .palette
        .iter()
        .map(|swatch| format!("{} {} {}", swatch.role, swatch.name, swatch.hex))
        .collect();
    let _ = writeln!(out, "   Palette: {}", palette.join(" | "));
    out
}

#[cfg(test)]
mod tests {
    use lumina_gateway::{StubGateway, STUB_PNG_BASE64};

    use super::*;

    fn stub() -> Arc<dyn ConceptGateway> {
        Arc::new(StubGateway)
    }

    async fn concepts_file(dir: &Path) -> PathBuf {
        let path = dir.join("concepts.json");
        let concepts = generate(stub(), "Acme", "Coffee", "Modern & Minimalist")
            .await
            .unwrap();
        write_concepts(&path, &concepts).unwrap();
        path
    }

    #[tokio::test]
    async fn generate_requires_name_and_industry() {
        let err = generate(stub(), "Acme", " ", "Bold").await.unwrap_err();
        assert!(err.to_string().contains("required"));
    }

    #[tokio::test]
    async fn generated_concepts_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = concepts_file(dir.path()).await;

        let json = std::fs::read_to_string(&path).unwrap();
        assert!(json.contains("\"conceptName\""));
        assert!(json.contains("\"meaning\""));

        let concepts = read_concepts(&path).unwrap();
        assert_eq!(concepts.len(), 3);
        assert_eq!(concepts[1].name, "Acme Orbit");
    }

    #[tokio::test]
    async fn refine_rewrites_only_the_chosen_concept() {
        let dir = tempfile::tempdir().unwrap();
        let path = concepts_file(dir.path()).await;
        let before = read_concepts(&path).unwrap();

        let refined = refine(stub(), &path, 2, "thinner ring").await.unwrap();
        assert!(refined.visual_description.contains("thinner ring"));

        let after = read_concepts(&path).unwrap();
        assert_eq!(after[0], before[0]);
        assert_eq!(after[1], refined);
        assert_eq!(after[2], before[2]);
    }

    #[tokio::test]
    async fn refine_rejects_bad_index_and_blank_feedback() {
        let dir = tempfile::tempdir().unwrap();
        let path = concepts_file(dir.path()).await;

        assert!(refine(stub(), &path, 0, "x").await.is_err());
        assert!(refine(stub(), &path, 4, "x").await.is_err());
        let err = refine(stub(), &path, 1, "   ").await.unwrap_err();
        assert!(err.to_string().contains("feedback"));
    }

    #[tokio::test]
    async fn visualize_saves_named_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = concepts_file(dir.path()).await;
        let out_dir = dir.path().join("assets");

        let saved = visualize(stub(), &path, 3, &out_dir).await.unwrap();
        assert_eq!(saved, out_dir.join("acme-crest-logo.png"));
        assert!(saved.exists());
    }

    #[tokio::test]
    async fn edit_image_writes_result() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("logo.png");
        let output = dir.path().join("logo-edited.png");
        let png = ImageData::new(DEFAULT_IMAGE_MIME, STUB_PNG_BASE64).decode().unwrap();
        std::fs::write(&input, &png).unwrap();

        edit_image(stub(), &input, "add a shadow", &output).await.unwrap();
        assert_eq!(std::fs::read(&output).unwrap(), png);

        assert!(edit_image(stub(), &input, "  ", &output).await.is_err());
    }

    #[test]
    fn invalid_concepts_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(
            &path,
            r##"[{"conceptName":"X","visualDescription":"v","meaning":"m","colorPalette":[{"type":"Primary","name":"n","hex":"blue"}]}]"##,
        )
        .unwrap();
        assert!(read_concepts(&path).is_err());
    }

    #[test]
    fn mime_follows_extension() {
        assert_eq!(mime_for_path(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("a.webp")), "image/webp");
        assert_eq!(mime_for_path(Path::new("a")), "image/png");
        assert_eq!(mime_for_path(Path::new("notes.txt")), "image/png");
    }

    #[tokio::test]
    async fn format_concept_lists_palette() {
        let concepts = generate(stub(), "Acme", "Coffee", "Bold").await.unwrap();
        let text = format_concept(1, &concepts[0]);
        assert!(text.starts_with("1. Acme Mark"));
        assert!(text.contains("Primary Signature #4F46E5"));
    }
}
