/// Utilitários para manipulação segura de strings UTF-8

/// Trunca uma string de forma segura, garantindo que o índice não corte no meio de um caractere UTF-8
///
/// # Argumentos
/// * `s` - String a ser truncada
/// * `max_bytes` - Número máximo de bytes a retornar
///
/// # Exemplo
/// ```
/// use email_schedule_backend::utils::string_utils::truncate_safe;
///
/// assert_eq!(truncate_safe("Olá, mundo!", 4), "Olá");
/// ```
pub fn truncate_safe(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }

    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }

    &s[..end]
}

/// Trunca uma string e adiciona um sufixo (como "...") de forma segura
pub fn truncate_with_suffix(s: &str, max_bytes: usize, suffix: &str) -> String {
    let truncated = truncate_safe(s, max_bytes);
    if truncated.len() < s.len() {
        format!("{}{}", truncated, suffix)
    } else {
        truncated.to_string()
    }
}

/// Versão para log de codes, tokens e states: só os primeiros caracteres
///
/// Valores curtos demais (até 8 bytes) são totalmente ocultados.
pub fn mask_secret(s: &str) -> String {
    if s.len() <= 8 {
        return "***".to_string();
    }
    truncate_with_suffix(s, 6, "...")
}
