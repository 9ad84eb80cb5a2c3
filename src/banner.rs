//! Startup banner, story rendering, and session summary.

use crate::consts::{AUTHOR, HOMEPAGE, REPO};
use crate::story::StoryResult;

/// Session configuration for display in the startup banner.
pub struct BannerInfo<'a> {
    pub text_model: &'a str,
    pub image_model: &'a str,
    pub auth_status: &'a str,
    pub download_dir: &'a std::path::Path,
}

/// Print the startup banner with session info.
pub fn print_banner(info: &BannerInfo) {
    println!(
        r#"
   ╔═══════════════════════════════════════╗
   ║     B I Ê N   N I Ê N   S Ử           ║
   ║          D O A N H   N H Â N          ║
   ╚═══════════════════════════════════════╝

   Khám phá những khoảnh khắc định hình nên sự vĩ đại.

   version   {}
   by        {}
   home      {}
   repo      {}
   text      {}
   image     {}
   auth      {}
   downloads {}

   Enter / new  tạo câu chuyện mới     /copy  sao chép
   /save [dir]  tải ảnh                /quit  thoát
"#,
        env!("CARGO_PKG_VERSION"),
        AUTHOR,
        HOMEPAGE,
        REPO,
        info.text_model,
        info.image_model,
        info.auth_status,
        info.download_dir.display(),
    );
}

/// Render a finished story for the terminal.
pub fn render_story(story: &StoryResult) -> String {
    let rule = "─".repeat(story.subject_name.chars().count().max(8));
    format!(
        "\n{}\n{}\n\n{}\n\n[ảnh: {}]\n",
        story.subject_name,
        rule,
        story.narrative,
        story.download_file_name(),
    )
}

/// Print the session summary (story count + farewell).
pub fn print_session_summary(generated: u64) {
    if generated > 0 {
        println!("session: {} stories", generated);
    }
    println!("tạm biệt.");
}
