//! Multipart form decoding for posts and profile updates

use axum::{
    extract::{
        Multipart,
        multipart::{Field, MultipartError},
    },
    http::StatusCode,
};
use social::{
    models::Upload,
    validation::{PostForm, ProfileForm},
};

use crate::error::{ApiError, ApiResult};

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

async fn read_upload(field: Field<'_>) -> ApiResult<Upload> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let bytes = field.bytes().await.map_err(multipart_error)?;

    Ok(Upload {
        file_name,
        content_type,
        bytes: bytes.to_vec(),
    })
}

/// Read `text` and any number of `photos` parts; other parts are ignored
pub async fn read_post_form(mut multipart: Multipart) -> ApiResult<PostForm> {
    let mut form = PostForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "text" => form.text = field.text().await.map_err(multipart_error)?,
            "photos" => form.photos.push(read_upload(field).await?),
            _ => {}
        }
    }

    Ok(form)
}

/// Read `full_name`, `bio` and `avatar`; absent parts leave the field unchanged
pub async fn read_profile_form(mut multipart: Multipart) -> ApiResult<ProfileForm> {
    let mut form = ProfileForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "full_name" => form.full_name = Some(field.text().await.map_err(multipart_error)?),
            "bio" => form.bio = Some(field.text().await.map_err(multipart_error)?),
            "avatar" => form.avatar = Some(read_upload(field).await?),
            _ => {}
        }
    }

    Ok(form)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::{
        body::Body,
        extract::FromRequest,
        http::{Request, header::CONTENT_TYPE},
    };

    const BOUNDARY: &str = "X-FEED-TEST-BOUNDARY";

    /// One multipart part: (name, optional file name, content)
    pub(crate) type Part<'a> = (&'a str, Option<&'a str>, &'a str);

    pub(crate) async fn multipart(parts: &[Part<'_>]) -> Multipart {
        let mut body = Vec::new();
        for (name, file_name, content) in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match file_name {
                Some(file_name) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: image/png\r\n\r\n",
                        name, file_name
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                ),
            }
            body.extend_from_slice(content.as_bytes());
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        let request = Request::builder()
            .method("POST")
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();

        Multipart::from_request(request, &()).await.unwrap()
    }

    #[tokio::test]
    async fn test_read_post_form() {
        let form = read_post_form(
            multipart(&[
                ("text", None, "hello"),
                ("photos", Some("a.png"), "png-a"),
                ("photos", Some("b.png"), "png-b"),
                ("unrelated", None, "ignored"),
            ])
            .await,
        )
        .await
        .unwrap();

        assert_eq!(form.text, "hello");
        assert_eq!(form.photos.len(), 2);
        assert_eq!(form.photos[0].file_name, "a.png");
        assert_eq!(form.photos[0].content_type, "image/png");
        assert_eq!(form.photos[1].bytes, b"png-b");
    }

    #[tokio::test]
    async fn test_read_profile_form() {
        let form = read_profile_form(
            multipart(&[("bio", None, "hi there"), ("avatar", Some("me.png"), "png")]).await,
        )
        .await
        .unwrap();

        assert_eq!(form.full_name, None);
        assert_eq!(form.bio.as_deref(), Some("hi there"));
        assert_eq!(form.avatar.unwrap().file_name, "me.png");
    }
}
