use venice_engine::ImageResponse;

/// HTML snippet shown next to a generated image, with hover thumbs up/down
/// controls wired to the approve and regenerate links.
pub fn image_fragment(image: &ImageResponse) -> String {
    let id = escape_html(&image.image_id);
    let url = escape_html(&image.image_url);
    let approve = escape_html(&image.thumbs_up_url);
    let regenerate = escape_html(&image.thumbs_down_url);
    let badge = if image.degraded {
        "<div class=\"venice-image-degraded\">Image generation unavailable; showing a placeholder.</div>"
    } else {
        ""
    };

    format!(
        r#"<div class="venice-image-container" data-image-id="{id}">
  <img src="{url}" alt="Generated image {id}" />
  {badge}
  <div class="hover-controls">
    <button class="thumbs-up" data-image-id="{id}" data-action-url="{approve}" onclick="callApproveImage(this.dataset.imageId, this.dataset.actionUrl)">👍</button>
    <button class="thumbs-down" data-image-id="{id}" data-action-url="{regenerate}" onclick="callRegenerateImage(this.dataset.imageId, this.dataset.actionUrl)">👎</button>
  </div>
</div>
<style>
  .venice-image-container {{ position: relative; display: inline-block; }}
  .venice-image-container img {{ max-width: 100%; display: block; }}
  .venice-image-container .hover-controls {{ position: absolute; bottom: 8px; right: 8px; display: none; gap: 6px; }}
  .venice-image-container:hover .hover-controls {{ display: flex; }}
</style>
<script>
  function callApproveImage(imageId, actionUrl) {{
    return fetch(actionUrl, {{ method: "POST" }}).then((response) => response.json());
  }}
  function callRegenerateImage(imageId, actionUrl) {{
    return fetch(actionUrl, {{ method: "POST" }}).then((response) => response.json());
  }}
</script>"#
    )
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use venice_engine::ImageResponse;

    use super::{escape_html, image_fragment};

    fn image(degraded: bool) -> ImageResponse {
        ImageResponse {
            image_id: "abc".to_string(),
            image_url: "https://cdn.example/a.png?x=1&y=\"2\"".to_string(),
            thumbs_up_url: "http://localhost:8000/approve/abc".to_string(),
            thumbs_down_url: "http://localhost:8000/regenerate/abc".to_string(),
            degraded,
        }
    }

    #[test]
    fn fragment_contains_hover_controls() {
        let html = image_fragment(&image(false));
        assert!(html.contains("venice-image-container"));
        assert!(html.contains("hover-controls"));
        assert!(html.contains("callApproveImage"));
        assert!(html.contains("callRegenerateImage"));
        assert!(html.contains("data-action-url=\"http://localhost:8000/approve/abc\""));
        assert!(!html.contains("venice-image-degraded"));
    }

    #[test]
    fn fragment_escapes_urls_and_flags_placeholders() {
        let html = image_fragment(&image(true));
        assert!(html.contains("src=\"https://cdn.example/a.png?x=1&amp;y=&quot;2&quot;\""));
        assert!(html.contains("venice-image-degraded"));
    }

    #[test]
    fn escape_html_handles_markup() {
        assert_eq!(
            escape_html("<a href='x'>&</a>"),
            "&lt;a href=&#39;x&#39;&gt;&amp;&lt;/a&gt;"
        );
    }
}
