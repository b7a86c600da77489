use crate::domain::DomainError;
use actix_multipart::Multipart;
use futures::StreamExt;

const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Raw multipart fields of the article create/update form. Presence checks
/// belong to the service; this only transports what the client sent.
#[derive(Debug, Default)]
pub struct ArticleForm {
    pub title: Option<String>,
    pub content: Option<String>,
    /// Uploaded file as (original filename, bytes).
    pub image: Option<(String, Vec<u8>)>,
    /// Externally hosted image, alternative to an upload.
    pub image_url: Option<String>,
    pub is_published: Option<bool>,
    pub category_id: Option<i64>,
}

fn bad(msg: impl std::fmt::Display) -> DomainError {
    DomainError::ValidationError(format!("Bad form data: {}", msg))
}

fn text(data: Vec<u8>) -> Result<String, DomainError> {
    String::from_utf8(data).map_err(bad)
}

pub async fn read_article_form(mut payload: Multipart) -> Result<ArticleForm, DomainError> {
    let mut form = ArticleForm::default();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(bad)?;
        let disposition = field.content_disposition();
        let name = disposition.get_name().unwrap_or_default().to_string();
        let filename = disposition.get_filename().map(str::to_string);

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(bad)?;
            if data.len() + chunk.len() > MAX_IMAGE_BYTES {
                return Err(DomainError::ValidationError(
                    "Image exceeds the 5MB upload limit".to_string(),
                ));
            }
            data.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "image" => {
                if let Some(filename) = filename {
                    form.image = Some((filename, data));
                }
            }
            "title" => form.title = Some(text(data)?),
            "content" => form.content = Some(text(data)?),
            "image_url" => {
                let value = text(data)?;
                if !value.trim().is_empty() {
                    form.image_url = Some(value);
                }
            }
            "is_published" => {
                form.is_published = Some(text(data)?.trim().parse::<bool>().map_err(bad)?)
            }
            "category_id" => {
                let value = text(data)?;
                if !value.trim().is_empty() {
                    form.category_id = Some(value.trim().parse::<i64>().map_err(bad)?);
                }
            }
            // Unknown fields are ignored rather than rejected.
            _ => {}
        }
    }

    Ok(form)
}
