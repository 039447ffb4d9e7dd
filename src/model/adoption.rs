use serde::Serialize;

/// Adoption request sent to the publication's author.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AdoptionRequest {
    pub publication_id: String,
    pub publication_author_email: Option<String>,
    pub publication_text: String,
    pub requester_info: RequesterInfo,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RequesterInfo {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "telefone")]
    pub phone: String,
    pub email: String,
    #[serde(rename = "disponibilidade")]
    pub availability: String,
    #[serde(rename = "experiencia")]
    pub experience: String,
    #[serde(rename = "moradia")]
    pub housing: String,
    #[serde(rename = "motivacao")]
    pub motivation: String,
}
