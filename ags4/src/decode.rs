//! Décodage des octets d'un fichier AGS en texte
//!
//! Les fichiers AGS4 sont en UTF-8 ; certains logiciels de terrain exportent
//! encore en UTF-16 avec BOM. Tout le reste est refusé : une erreur de
//! décodage est fatale pour ce fichier seulement.

use std::path::Path;

use encoding_rs::Encoding;

use crate::AgsError;

/// Décode le contenu d'un fichier en texte
pub fn decode(file: &str, data: &[u8]) -> Result<String, AgsError> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(data) {
        let (text, had_errors) = encoding.decode_without_bom_handling(&data[bom_len..]);
        if had_errors {
            return Err(AgsError::encoding(
                file,
                format!("invalid {} sequence", encoding.name()),
            ));
        }
        return Ok(text.into_owned());
    }

    match simdutf8::basic::from_utf8(data) {
        Ok(text) => Ok(text.to_owned()),
        Err(_) => {
            // Chemin lent uniquement pour localiser l'octet fautif
            let offset = simdutf8::compat::from_utf8(data)
                .err()
                .map(|e| e.valid_up_to())
                .unwrap_or(0);
            Err(AgsError::encoding(
                file,
                format!("invalid UTF-8 at byte {}", offset),
            ))
        }
    }
}

/// Lit et décode un fichier depuis le disque
pub fn read_file(path: &Path) -> Result<String, AgsError> {
    let data = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    decode(&name, &data)
}
