//! Attachment risk analysis (spec §4.6).

use forensics_types::request::AttachmentMeta;
use forensics_types::results::{AttachmentAnalysisResult, AttachmentResult, Risk};

const EXECUTABLE_EXT: &[&str] = &["exe", "scr", "bat", "cmd", "com", "pif", "vbs", "js", "jar", "msi", "ps1", "wsf"];
const MACRO_OFFICE_EXT: &[&str] = &["docm", "xlsm", "pptm", "dotm", "xltm"];
const ARCHIVE_EXT: &[&str] = &["zip", "rar", "7z", "tar", "gz", "iso"];

const MIME_EXT_MAP: &[(&str, &[&str])] = &[
    ("application/pdf", &["pdf"]),
    ("image/jpeg", &["jpg", "jpeg"]),
    ("image/png", &["png"]),
    ("application/zip", &["zip"]),
    ("text/plain", &["txt"]),
    ("application/msword", &["doc", "dot"]),
];

const MALWARE_NAME_PATTERNS: &[&str] = &["invoice", "statement", "receipt", "payment", "scan", "document"];

fn extensions(filename: &str) -> Vec<String> {
    filename.split('.').skip(1).map(|s| s.to_ascii_lowercase()).collect()
}

fn last_extension(filename: &str) -> Option<String> {
    extensions(filename).last().cloned()
}

fn has_bidi_control(filename: &str) -> bool {
    // U+202E RIGHT-TO-LEFT OVERRIDE, U+2066 LEFT-TO-RIGHT ISOLATE, and
    // related Unicode bidi controls used to spoof file extensions.
    filename.chars().any(|c| matches!(c, '\u{202E}' | '\u{202D}' | '\u{2066}' | '\u{2067}' | '\u{2068}'))
}

fn has_non_cjk_non_latin_script(filename: &str) -> bool {
    filename.chars().any(|c| {
        let cp = c as u32;
        let is_cjk = (0x4E00..=0x9FFF).contains(&cp) || (0x3040..=0x30FF).contains(&cp) || (0xAC00..=0xD7A3).contains(&cp);
        let is_latin = c.is_ascii() || (0x00C0..=0x024F).contains(&cp);
        !is_cjk && !is_latin && c.is_alphabetic()
    })
}

fn mime_mismatch(filename: &str, mime: &str) -> bool {
    let ext = match last_extension(filename) {
        Some(e) => e,
        None => return false,
    };
    MIME_EXT_MAP
        .iter()
        .find(|(m, _)| m.eq_ignore_ascii_case(mime))
        .map(|(_, exts)| !exts.contains(&ext.as_str()))
        .unwrap_or(false)
}

fn analyze_one(att: &AttachmentMeta) -> AttachmentResult {
    let mut checks = Vec::new();
    let mut issues = Vec::new();
    let mut risk = Risk::Safe;
    let mut bump = |r: Risk, check: &str, issue: &str| {
        checks.push(check.to_string());
        issues.push(issue.to_string());
        if r > risk {
            risk = r;
        }
    };

    let exts = extensions(&att.filename);
    let last_ext = last_extension(&att.filename);

    if let Some(ext) = &last_ext {
        if EXECUTABLE_EXT.contains(&ext.as_str()) {
            bump(Risk::Dangerous, "executable-extension", "executable file extension");
        }
        if MACRO_OFFICE_EXT.contains(&ext.as_str()) {
            bump(Risk::Suspicious, "macro-office-extension", "macro-enabled Office document");
        }
        if ARCHIVE_EXT.contains(&ext.as_str()) {
            bump(Risk::Suspicious, "archive-extension", "archive attachment");
        }
        if exts.len() >= 2 && EXECUTABLE_EXT.contains(&ext.as_str()) {
            bump(Risk::Dangerous, "double-extension", "double extension ending in an executable type");
        }
    }

    if has_bidi_control(&att.filename) {
        bump(Risk::Dangerous, "bidi-control-char", "filename contains a Unicode bidi override character");
    }

    if mime_mismatch(&att.filename, &att.mime) {
        bump(Risk::Suspicious, "mime-extension-mismatch", "declared MIME type does not match file extension");
    }

    if att.filename.chars().count() > 150 {
        bump(Risk::Suspicious, "filename-too-long", "filename longer than 150 characters");
    }

    if has_non_cjk_non_latin_script(&att.filename) {
        bump(Risk::Suspicious, "unusual-script", "filename uses an unusual script");
    }

    let lower_name = att.filename.to_ascii_lowercase();
    if MALWARE_NAME_PATTERNS.iter().any(|p| lower_name.contains(p))
        && last_ext.as_deref().map(|e| EXECUTABLE_EXT.contains(&e)).unwrap_or(false)
    {
        bump(Risk::Dangerous, "malware-name-pattern", "filename mimics a document but carries an executable extension");
    }

    if att.size == 0 {
        bump(Risk::Suspicious, "empty-attachment", "attachment is empty");
    }
    if att.size > 25 * 1024 * 1024 {
        bump(Risk::Suspicious, "oversized-attachment", "attachment exceeds 25 MiB");
    }

    AttachmentResult {
        filename: att.filename.clone(),
        risk,
        checks,
        issues,
    }
}

/// Score every attachment, sorted dangerous→suspicious→safe.
pub fn analyze_attachments(attachments: &[AttachmentMeta]) -> AttachmentAnalysisResult {
    let mut results: Vec<AttachmentResult> = attachments.iter().map(analyze_one).collect();
    results.sort_by(|a, b| b.risk.cmp(&a.risk));
    AttachmentAnalysisResult { attachments: results }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn att(filename: &str, mime: &str, size: u64) -> AttachmentMeta {
        AttachmentMeta {
            filename: filename.to_string(),
            mime: mime.to_string(),
            size,
        }
    }

    #[test]
    fn exe_attachment_is_dangerous() {
        let result = analyze_one(&att("invoice.exe", "application/octet-stream", 1024));
        assert_eq!(result.risk, Risk::Dangerous);
    }

    #[test]
    fn double_extension_malware_pattern_is_dangerous() {
        let result = analyze_one(&att("invoice.pdf.exe", "application/octet-stream", 1024));
        assert_eq!(result.risk, Risk::Dangerous);
        assert!(result.checks.contains(&"double-extension".to_string()));
    }

    #[test]
    fn plain_pdf_is_safe() {
        let result = analyze_one(&att("report.pdf", "application/pdf", 2048));
        assert_eq!(result.risk, Risk::Safe);
    }

    #[test]
    fn empty_attachment_is_flagged() {
        let result = analyze_one(&att("file.txt", "text/plain", 0));
        assert!(result.checks.contains(&"empty-attachment".to_string()));
    }

    #[test]
    fn oversized_attachment_is_flagged() {
        let result = analyze_one(&att("file.zip", "application/zip", 26 * 1024 * 1024));
        assert!(result.checks.contains(&"oversized-attachment".to_string()));
    }

    #[test]
    fn bidi_override_in_filename_is_dangerous() {
        let result = analyze_one(&att("invoice\u{202E}fdp.exe", "application/octet-stream", 1024));
        assert_eq!(result.risk, Risk::Dangerous);
    }
}
