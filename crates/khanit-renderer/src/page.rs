//! Full article pages.
//!
//! [`ArticlePage`] ties the pieces together: the body is segmented and each
//! segment handed to its formatter, the outline and share bar are built from
//! the same post, and everything is written out as one html document. A body
//! that fails to render is replaced by [`CONTENT_ERROR_MESSAGE`]; the rest of
//! the page still renders.
//!
//! Around the body the page carries the category chip and date, the author,
//! the featured image, tags, an author bio box and up to
//! [`RELATED_POSTS_LIMIT`] related articles.

use chrono::{DateTime, Utc};
use pulldown_cmark_escape::{FmtWriter, escape_href, escape_html, escape_html_body_text};
use url::Url;

use crate::code_block::CodeRenderer;
use crate::config::RenderConfig;
use crate::date::format_thai_date;
use crate::math::render_math_segment;
use crate::post::{Author, Post, RELATED_POSTS_LIMIT};
use crate::segment::{Segment, Segmenter};
use crate::share::{ShareActions, ShareData, encode_uri_component, share_script};
use crate::toc::{TableOfContents, toc_script};

/// Shown in place of an article body that could not be rendered
pub const CONTENT_ERROR_MESSAGE: &str =
    "เกิดข้อผิดพลาดในการแสดงเนื้อหา กรุณาลองใหม่อีกครั้ง หรือติดต่อผู้ดูแลระบบ";

pub const AUTHOR_BIO_HEADING: &str = "เกี่ยวกับผู้เขียน";
pub const RELATED_POSTS_HEADING: &str = "บทความที่เกี่ยวข้อง";
/// Card image for related posts without a featured image
pub const POST_PLACEHOLDER_IMAGE: &str = "/images/post-placeholder.jpg";

#[derive(Debug, Clone)]
pub struct ArticlePage<'a> {
    post: &'a Post,
    config: &'a RenderConfig,
    segmenter: Segmenter,
    code: CodeRenderer,
    related: Vec<&'a Post>,
}

impl<'a> ArticlePage<'a> {
    pub fn new(post: &'a Post, config: &'a RenderConfig) -> Self {
        Self {
            post,
            config,
            segmenter: Segmenter::default().with_hard_breaks(config.hard_breaks),
            code: CodeRenderer::default(),
            related: Vec::new(),
        }
    }

    /// List related articles picked from `candidates` (see [`Post::related`]).
    pub fn with_related(mut self, candidates: &'a [Post]) -> Self {
        self.related = self.post.related(candidates, RELATED_POSTS_LIMIT);
        self
    }

    pub fn with_code_renderer(mut self, code: CodeRenderer) -> Self {
        self.code = code;
        self
    }

    /// `site_url` joined with `/blog/{slug}`
    pub fn canonical_url(&self) -> Url {
        let path = format!("/blog/{}", self.post.slug);
        match self.config.site_url.join(&path) {
            Ok(url) => url,
            Err(err) => {
                tracing::warn!(error = %err, slug = %self.post.slug, "bad slug for canonical url");
                self.config.site_url.clone()
            }
        }
    }

    pub fn table_of_contents(&self) -> TableOfContents {
        TableOfContents::from_document(&self.post.content)
    }

    pub fn share_actions(&self) -> ShareActions {
        ShareActions::new(
            ShareData {
                title: self.post.title.clone(),
                text: self.post.excerpt.clone(),
                url: self.canonical_url(),
            },
            self.config.share.clone(),
        )
    }

    fn render_segment(&self, segment: &Segment, out: &mut String) {
        match segment {
            Segment::Html { markup } => out.push_str(markup),
            Segment::Math {
                expression,
                display,
            } => out.push_str(&render_math_segment(expression, *display)),
            Segment::Code { source, language } => out.push_str(&self.code.render(source, language)),
        }
    }

    /// Article body html. Never fails: a body that can't be segmented
    /// becomes the fixed error notice.
    #[tracing::instrument(level = "debug", skip(self), fields(slug = %self.post.slug))]
    pub fn render_body(&self) -> String {
        match self.segmenter.segment(&self.post.content) {
            Ok(segments) => {
                let mut out = String::with_capacity(self.post.content.len() * 2);
                for segment in &segments {
                    self.render_segment(segment, &mut out);
                }
                out
            }
            Err(err) => {
                tracing::warn!(error = %err, "article body replaced with error notice");
                format!("<div class=\"content-error\" role=\"alert\"><p>{CONTENT_ERROR_MESSAGE}</p></div>\n")
            }
        }
    }

    /// `<time>` in the configured offset, so late-evening posts keep their local date.
    fn write_date(&self, out: &mut String, published: &DateTime<Utc>) {
        let local = published.with_timezone(&self.config.utc_offset);
        out.push_str("<time datetime=\"");
        out.push_str(&local.to_rfc3339());
        out.push_str("\">");
        out.push_str(&format_thai_date(&local));
        out.push_str("</time>");
    }

    fn write_header(&self, out: &mut String) {
        out.push_str("<header>\n");
        if self.post.category.is_some() || self.post.published_at.is_some() {
            out.push_str("<div class=\"article-meta\">");
            if let Some(category) = &self.post.category {
                out.push_str("<a class=\"category\" href=\"/blog?category=");
                let _ = escape_href(FmtWriter(&mut *out), &encode_uri_component(&category.id));
                out.push_str("\">");
                let _ = escape_html_body_text(FmtWriter(&mut *out), &category.name);
                out.push_str("</a>");
            }
            if let Some(published) = &self.post.published_at {
                self.write_date(out, published);
            }
            out.push_str("</div>\n");
        }
        out.push_str("<h1 class=\"article-title\">");
        let _ = escape_html_body_text(FmtWriter(&mut *out), &self.post.title);
        out.push_str("</h1>\n");
        if let Some(author) = &self.post.author {
            out.push_str("<div class=\"article-author\">");
            write_avatar(out, author, 48);
            out.push_str("<div><div class=\"author-name\">");
            let _ = escape_html_body_text(FmtWriter(&mut *out), &author.name);
            out.push_str("</div>");
            if let Some(bio) = &author.bio {
                out.push_str("<div class=\"author-bio\">");
                let _ = escape_html_body_text(FmtWriter(&mut *out), bio);
                out.push_str("</div>");
            }
            out.push_str("</div></div>\n");
        }
        out.push_str("</header>\n");
        if let Some(image) = &self.post.featured_image {
            out.push_str("<figure class=\"featured-image\"><img src=\"");
            let _ = escape_href(FmtWriter(&mut *out), image);
            out.push_str("\" alt=\"");
            let _ = escape_html(FmtWriter(&mut *out), &self.post.title);
            out.push_str("\" width=\"900\" height=\"500\"></figure>\n");
        }
    }

    fn write_author_box(&self, out: &mut String) {
        let Some(author) = &self.post.author else {
            return;
        };
        let Some(bio) = &author.bio else {
            return;
        };
        out.push_str("<aside class=\"author-box\">\n");
        write_avatar(out, author, 64);
        out.push_str("<h3>");
        out.push_str(AUTHOR_BIO_HEADING);
        out.push_str("</h3>\n<div class=\"author-name\">");
        let _ = escape_html_body_text(FmtWriter(&mut *out), &author.name);
        out.push_str("</div>\n<p>");
        let _ = escape_html_body_text(FmtWriter(&mut *out), bio);
        out.push_str("</p>\n</aside>\n");
    }

    fn write_related(&self, out: &mut String) {
        if self.related.is_empty() {
            return;
        }
        out.push_str("<section class=\"related-posts\">\n<h2>");
        out.push_str(RELATED_POSTS_HEADING);
        out.push_str("</h2>\n<ul>\n");
        for post in &self.related {
            out.push_str("<li><a href=\"/blog/");
            let _ = escape_href(FmtWriter(&mut *out), &encode_uri_component(&post.slug));
            out.push_str("\"><img src=\"");
            let image = post.featured_image.as_deref().unwrap_or(POST_PLACEHOLDER_IMAGE);
            let _ = escape_href(FmtWriter(&mut *out), image);
            out.push_str("\" alt=\"");
            let _ = escape_html(FmtWriter(&mut *out), &post.title);
            out.push_str("\">");
            if let Some(published) = &post.published_at {
                self.write_date(out, published);
            }
            out.push_str("<h3>");
            let _ = escape_html_body_text(FmtWriter(&mut *out), &post.title);
            out.push_str("</h3>");
            if !post.excerpt.is_empty() {
                out.push_str("<p>");
                let _ = escape_html_body_text(FmtWriter(&mut *out), &post.excerpt);
                out.push_str("</p>");
            }
            out.push_str("</a></li>\n");
        }
        out.push_str("</ul>\n</section>\n");
    }

    fn write_tags(&self, out: &mut String) {
        if self.post.tags.is_empty() {
            return;
        }
        out.push_str("<ul class=\"tags\">\n");
        for tag in &self.post.tags {
            out.push_str("<li><a href=\"/blog?tag=");
            let _ = escape_href(FmtWriter(&mut *out), &encode_uri_component(tag));
            out.push_str("\">#");
            let _ = escape_html_body_text(FmtWriter(&mut *out), tag);
            out.push_str("</a></li>\n");
        }
        out.push_str("</ul>\n");
    }

    /// The whole document with `stylesheet` inlined.
    pub fn render_with_stylesheet(&self, stylesheet: &str) -> String {
        let canonical = self.canonical_url();
        let mut out = String::new();

        out.push_str("<!DOCTYPE html>\n<html lang=\"th\">\n<head>\n<meta charset=\"utf-8\">\n");
        out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n<title>");
        let _ = escape_html_body_text(FmtWriter(&mut out), &self.post.title);
        out.push_str("</title>\n");
        if !self.post.excerpt.is_empty() {
            out.push_str("<meta name=\"description\" content=\"");
            let _ = escape_html(FmtWriter(&mut out), &self.post.excerpt);
            out.push_str("\">\n");
        }
        out.push_str("<link rel=\"canonical\" href=\"");
        let _ = escape_html(FmtWriter(&mut out), canonical.as_str());
        out.push_str("\">\n<style>\n");
        out.push_str(stylesheet);
        out.push_str("</style>\n</head>\n<body>\n<article class=\"article\">\n");

        self.write_header(&mut out);
        let share = self.share_actions().to_html();
        out.push_str(&share);
        out.push_str(&self.table_of_contents().to_html(None));
        out.push_str("<div class=\"blog-content\">\n");
        out.push_str(&self.render_body());
        out.push_str("</div>\n");
        self.write_tags(&mut out);
        self.write_author_box(&mut out);
        self.write_related(&mut out);
        out.push_str("</article>\n");

        out.push_str(&toc_script(&self.config.toc_margin));
        out.push_str(&share_script(self.config.copy_feedback_ms()));
        out.push_str("</body>\n</html>\n");
        out
    }

    /// The whole document with the generated stylesheet.
    pub fn render(&self) -> miette::Result<String> {
        let css = crate::css::generate_css(self.config)?;
        Ok(self.render_with_stylesheet(&css))
    }
}

fn write_avatar(out: &mut String, author: &Author, size: u32) {
    match &author.avatar_url {
        Some(url) => {
            out.push_str("<img class=\"avatar\" src=\"");
            let _ = escape_href(FmtWriter(&mut *out), url);
            out.push_str("\" alt=\"");
            let _ = escape_html(FmtWriter(&mut *out), &author.name);
            out.push_str(&format!("\" width=\"{size}\" height=\"{size}\">"));
        }
        None => {
            out.push_str("<span class=\"avatar avatar-initial\">");
            if let Some(initial) = author.initial() {
                let _ = escape_html_body_text(FmtWriter(&mut *out), initial.encode_utf8(&mut [0; 4]));
            }
            out.push_str("</span>");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::Category;
    use chrono::{TimeZone, Utc};

    fn post() -> Post {
        let mut post = Post::new(
            "ความน่าจะเป็น <เบื้องต้น>",
            "probability-101",
            "## บทนำ\n\nค่า $p$ อยู่ระหว่าง 0 กับ 1\n\n$$\\sum_i p_i = 1$$\n\n```python\nprint(1)\n```\n",
        );
        post.excerpt = "พื้นฐาน \"ความน่าจะเป็น\"".into();
        post.tags = vec!["math".into(), "สถิติ".into()];
        post.published_at = Some(Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap());
        post.author = Some(Author {
            bio: Some("ครูคณิตศาสตร์ <ม.ปลาย>".into()),
            ..Author::new("ครูขนิษฐ์")
        });
        post.category = Some(Category {
            id: "stats".into(),
            name: "สถิติ".into(),
        });
        post
    }

    fn config() -> RenderConfig {
        RenderConfig {
            site_url: Url::parse("https://khanit.example/").unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn canonical_url_uses_slug() {
        let (post, config) = (post(), config());
        let page = ArticlePage::new(&post, &config);
        assert_eq!(
            page.canonical_url().as_str(),
            "https://khanit.example/blog/probability-101"
        );
    }

    #[test]
    fn thai_slug_is_percent_encoded_in_url() {
        let post = Post::new("t", "สถิติ", "body");
        let config = config();
        let page = ArticlePage::new(&post, &config);
        assert!(
            page.canonical_url()
                .as_str()
                .starts_with("https://khanit.example/blog/%E0%B8%AA")
        );
    }

    #[test]
    fn body_dispatches_every_segment() {
        let (post, config) = (post(), config());
        let body = ArticlePage::new(&post, &config).render_body();
        assert!(body.contains("<h2 id=\"บทนำ\">บทนำ</h2>"));
        assert!(body.contains("<span class=\"math math-inline\"><math"));
        assert!(body.contains("<div class=\"math math-display\"><math"));
        assert!(body.contains("<div class=\"code-block\" data-language=\"python\">"));
        assert!(body.contains("data-code=\"print(1)\""));
        assert!(!body.contains('$'));
    }

    #[test]
    fn empty_body_becomes_error_notice() {
        let post = Post::new("t", "t", "");
        let config = config();
        let body = ArticlePage::new(&post, &config).render_body();
        assert_eq!(
            body,
            format!("<div class=\"content-error\" role=\"alert\"><p>{CONTENT_ERROR_MESSAGE}</p></div>\n")
        );
    }

    #[test]
    fn bad_math_does_not_fail_the_body() {
        let post = Post::new("t", "t", "broken $\\frac{a}$ here");
        let config = config();
        let body = ArticlePage::new(&post, &config).render_body();
        assert!(body.contains("math-error"));
        assert!(body.contains("here</p>"));
    }

    #[test]
    fn document_has_head_and_chrome() {
        let (post, config) = (post(), config());
        let html = ArticlePage::new(&post, &config).render_with_stylesheet("/* css */\n");
        assert!(html.starts_with("<!DOCTYPE html>\n<html lang=\"th\">"));
        assert!(html.contains("<title>ความน่าจะเป็น &lt;เบื้องต้น&gt;</title>"));
        assert!(html.contains("<meta name=\"description\" content=\"พื้นฐาน &quot;ความน่าจะเป็น&quot;\">"));
        assert!(html.contains("<link rel=\"canonical\" href=\"https://khanit.example/blog/probability-101\">"));
        assert!(html.contains("<time datetime=\"2024-03-05T16:00:00+07:00\">5 มีนาคม 2567</time>"));
        assert!(html.contains("<a class=\"category\" href=\"/blog?category=stats\">สถิติ</a>"));
        assert!(html.contains(
            "<div class=\"article-author\"><span class=\"avatar avatar-initial\">ค</span><div><div class=\"author-name\">ครูขนิษฐ์</div>"
        ));
        assert!(html.contains("<h3>เกี่ยวกับผู้เขียน</h3>"));
        assert!(html.contains("<p>ครูคณิตศาสตร์ &lt;ม.ปลาย&gt;</p>"));
        assert!(!html.contains("featured-image"));
        assert!(!html.contains("related-posts"));
        assert!(html.contains("<a href=\"/blog?tag=math\">#math</a>"));
        assert!(html.contains("<a href=\"/blog?tag=%E0%B8%AA"));
        assert!(html.contains("<nav class=\"toc-nav\" hidden>"));
        assert!(html.contains("class=\"share-bar\""));
        assert!(html.contains("rootMargin: '0px 0px -80% 0px'"));
        assert!(html.contains("}, 2000);"));
        assert!(html.ends_with("</body>\n</html>\n"));
    }

    #[test]
    fn evening_post_keeps_its_local_date() {
        let mut post = Post::new("t", "t", "body");
        post.published_at = Some(Utc.with_ymd_and_hms(2024, 3, 5, 20, 0, 0).unwrap());
        let config = config();
        let html = ArticlePage::new(&post, &config).render_with_stylesheet("");
        assert!(html.contains("<time datetime=\"2024-03-06T03:00:00+07:00\">6 มีนาคม 2567</time>"));
    }

    #[test]
    fn featured_image_and_avatar_url() {
        let mut post = Post::new("ภาพ \"ปก\"", "t", "body");
        post.featured_image = Some("/img/cover.png".into());
        post.author = Some(Author {
            avatar_url: Some("/img/me.png".into()),
            ..Author::new("ขนิษฐ์")
        });
        let config = config();
        let html = ArticlePage::new(&post, &config).render_with_stylesheet("");
        assert!(html.contains(
            "<figure class=\"featured-image\"><img src=\"/img/cover.png\" alt=\"ภาพ &quot;ปก&quot;\" width=\"900\" height=\"500\"></figure>"
        ));
        assert!(html.contains(
            "<img class=\"avatar\" src=\"/img/me.png\" alt=\"ขนิษฐ์\" width=\"48\" height=\"48\">"
        ));
        // no bio, no author box
        assert!(!html.contains("author-box"));
    }

    #[test]
    fn related_posts_are_listed() {
        let post = post();
        let mut sibling = Post::new("การแจกแจงปกติ", "normal", "body");
        sibling.excerpt = "ระฆังคว่ำ".into();
        sibling.category = post.category.clone();
        sibling.published_at = Some(Utc.with_ymd_and_hms(2024, 2, 1, 3, 0, 0).unwrap());
        let unrelated = Post::new("เซต", "sets", "body");
        let pool = vec![post.clone(), sibling, unrelated];
        let config = config();

        let html = ArticlePage::new(&post, &config)
            .with_related(&pool)
            .render_with_stylesheet("");
        assert!(html.contains("<section class=\"related-posts\">\n<h2>บทความที่เกี่ยวข้อง</h2>"));
        assert!(html.contains(
            "<li><a href=\"/blog/normal\"><img src=\"/images/post-placeholder.jpg\" alt=\"การแจกแจงปกติ\"><time datetime=\"2024-02-01T10:00:00+07:00\">1 กุมภาพันธ์ 2567</time><h3>การแจกแจงปกติ</h3><p>ระฆังคว่ำ</p></a></li>"
        ));
        assert!(!html.contains("/blog/sets"));
        assert!(!html.contains("href=\"/blog/probability-101\""));
    }
}
