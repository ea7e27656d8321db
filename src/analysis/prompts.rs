//! Prompt templates.
//!
//! All prompts are Indonesian; the model is expected to answer in Indonesian
//! too. Context-window management happens entirely here: history and article
//! excerpts are embedded verbatim, articles capped at
//! [`MAX_ARTICLE_CONTEXT_CHARS`].

use crate::models::{Article, ConversationTurn};
use crate::utils::truncate_chars;

pub const MAX_ARTICLE_CONTEXT_CHARS: usize = 1500;

/// Render turns as `User: …` / `Assistant: …` lines joined by `separator`.
pub fn format_history(history: &[ConversationTurn], separator: &str) -> String {
    history
        .iter()
        .map(|turn| format!("{}: {}", turn.role.label(), turn.message))
        .collect::<Vec<_>>()
        .join(separator)
}

/// Article context block for the fact-check prompt.
pub fn format_articles_context(articles: &[Article], query: &str) -> String {
    if articles.is_empty() {
        return format!(
            "Tidak ditemukan artikel berita yang reliabel untuk query: \"{query}\". Tidak dapat memverifikasi informasi."
        );
    }

    let blocks: String = articles
        .iter()
        .enumerate()
        .map(|(index, article)| article_block(index + 1, article))
        .collect();
    format!("Hasil Pencarian Berita untuk \"{query}\":\n\n{blocks}")
}

fn article_block(number: usize, article: &Article) -> String {
    let mut block = format!(
        "--- Artikel {number} ---\nSumber: {}\nJudul: {}\nURL: {}\n",
        article.source, article.title, article.url
    );
    if let Some(content) = &article.content {
        block.push_str(&format!(
            "Konten: {}\n",
            truncate_chars(content, MAX_ARTICLE_CONTEXT_CHARS)
        ));
    }
    if let Some(at) = &article.scraped_at {
        block.push_str(&format!("Diambil: {}\n", at.to_rfc3339()));
    }
    block.push('\n');
    block
}

pub fn classifier_prompt(query: &str, history: &[ConversationTurn]) -> String {
    let history_text = if history.is_empty() {
        "No previous conversation".to_string()
    } else {
        format_history(history, "\n")
    };

    format!(
        r#"
Kamu adalah classifier yang menentukan intent dari pertanyaan user dalam context fact-checking app.

Ada 2 kategori intent:
1. VERIFY_INFORMATION - User ingin memverifikasi informasi/berita baru (perlu web scraping)
2. FOLLOWUP_QUESTION - User bertanya tentang response sebelumnya (tidak perlu web scraping)

Riwayat Percakapan:
{history_text}

Pertanyaan User Saat Ini: "{query}"

Analisis:
- Jika user menanyakan informasi/berita BARU yang belum pernah dibahas, jawab: VERIFY_INFORMATION
- Jika user bertanya tentang penjelasan lebih lanjut, detail, atau klarifikasi dari response sebelumnya, jawab: FOLLOWUP_QUESTION
- Jika user menggunakan kata-kata seperti "maksudnya", "jelaskan lebih lanjut", "apa itu", "bagaimana bisa", "kenapa", jawab: FOLLOWUP_QUESTION
- Jika tidak ada riwayat percakapan, jawab: VERIFY_INFORMATION

Jawab HANYA dengan: VERIFY_INFORMATION atau FOLLOWUP_QUESTION
"#
    )
}

pub fn followup_prompt(query: &str, history: &[ConversationTurn]) -> String {
    let history_text = format_history(history, "\n\n");
    format!(
        r#"
Anda adalah asisten AI fact-checking untuk aplikasi NoFake. User sedang bertanya tentang response sebelumnya.

Riwayat Percakapan:
{history_text}

Pertanyaan User Saat Ini: "{query}"

Instruksi:
1. Jawab pertanyaan user berdasarkan context percakapan sebelumnya
2. Berikan penjelasan yang jelas dan detail
3. Jika perlu, rujuk ke informasi yang sudah dijelaskan sebelumnya
4. Tetap objektif dan faktual
5. Gunakan bahasa Indonesia yang baik
6. Jika pertanyaan tidak bisa dijawab dari context sebelumnya, katakan dengan jelas

Mohon berikan jawaban yang informatif dan membantu:
"#
    )
}

/// The verification prompt. `source_names` lists every configured outlet.
pub fn fact_check_prompt(query: &str, articles: &[Article], source_names: &[&str]) -> String {
    let news_context = format_articles_context(articles, query);
    let outlets = source_names.join(", ");
    format!(
        r#"
Anda adalah asisten AI fact-checking untuk aplikasi NoFake. Tugas Anda adalah menganalisis informasi berita dan memberikan fact-checking yang akurat dan tidak bias.

Pertanyaan User: "{query}"

Konteks Berita dari sumber Indonesia ({outlets}):
{news_context}

Mohon berikan analisis komprehensif yang mencakup:

1. **Ringkasan Fact Check**: Apakah informasi dalam pertanyaan akurat, sebagian akurat, salah, atau tidak dapat diverifikasi?

2. **Analisis Bukti**: Bukti apa yang mendukung atau membantah klaim tersebut? Rujuk artikel dan sumber spesifik.

3. **Kredibilitas Sumber**: Nilai keandalan sumber yang ditemukan.

4. **Konteks & Latar Belakang**: Berikan informasi latar belakang yang relevan untuk memahami topik.

5. **Kesimpulan**: Kesimpulan faktual yang jelas dengan tingkat kepercayaan (Tinggi/Sedang/Rendah).

6. **Rekomendasi**: Langkah verifikasi tambahan apa yang akan membantu?

Mohon respon dalam bahasa Indonesia, bersikap objektif, dan hindari spekulasi. Jika informasi tidak cukup, nyatakan dengan jelas.
"#
    )
}

pub fn title_prompt(query: &str) -> String {
    format!(
        r#"
Berikan judul singkat untuk percakapan berdasarkan pertanyaan berikut: "{query}"

PENTING:
- Maksimal 50 karakter
- Ringkas dan jelas
- Tangkap inti topik
- Dalam bahasa Indonesia
- HANYA berikan judulnya, tanpa tanda kutip atau penjelasan tambahan

Contoh:
User: "Apakah benar presiden jokowi akan memperpanjang masa jabatan?"
Title: Jokowi Perpanjang Masa Jabatan

User: "Benarkah vaksin covid menyebabkan autisme?"
Title: Vaksin COVID dan Autisme

Sekarang berikan judul untuk: "{query}"
"#
    )
}
