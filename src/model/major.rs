//! Major (program) catalog
//!
//! The server does not enforce membership: `StudentRecord::major` is free
//! text. The catalog only feeds the rendering layer's selector.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Major {
    Sija,
    Gp,
    Ka,
    Tki,
    Tflm,
    Tp,
    Tkr,
    Tbkr,
    Dpib,
    Toi,
    Titl,
}

impl Major {
    /// Catalog in display order
    pub const ALL: [Major; 11] = [
        Major::Sija,
        Major::Gp,
        Major::Ka,
        Major::Tki,
        Major::Tflm,
        Major::Tp,
        Major::Tkr,
        Major::Tbkr,
        Major::Dpib,
        Major::Toi,
        Major::Titl,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Major::Sija => "SIJA",
            Major::Gp => "GP",
            Major::Ka => "KA",
            Major::Tki => "TKI",
            Major::Tflm => "TFLM",
            Major::Tp => "TP",
            Major::Tkr => "TKR",
            Major::Tbkr => "TBKR",
            Major::Dpib => "DPIB",
            Major::Toi => "TOI",
            Major::Titl => "TITL",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Major::Sija => "Sistem Informasi Jaringan Aplikasi",
            Major::Gp => "Geologi Tambang",
            Major::Ka => "Kimia Analisis",
            Major::Tki => "Teknik Kimia Industri",
            Major::Tflm => "Teknik Fabrikasi Logam Manufaktur",
            Major::Tp => "Teknik Pemesinan",
            Major::Tkr => "Teknik Kendaraan Ringan",
            Major::Tbkr => "Teknik Body Kendaraan Ringan",
            Major::Dpib => "Desain Permodelan Informasi Bangunan",
            Major::Toi => "Teknik Otomasi Industri",
            Major::Titl => "Teknik Instalasi Tenaga Listrik",
        }
    }

    /// Exact, case-sensitive code lookup
    pub fn from_code(code: &str) -> Option<Major> {
        Self::ALL.into_iter().find(|m| m.code() == code)
    }

    pub fn info(&self) -> MajorInfo {
        MajorInfo {
            code: self.code(),
            name: self.name(),
        }
    }
}

/// Catalog entry as served to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MajorInfo {
    pub code: &'static str,
    pub name: &'static str,
}
