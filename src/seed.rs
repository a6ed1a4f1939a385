use tracing::info;

use crate::database::Database;
use crate::error::Error;
use crate::repository;
use crate::team::TeamMember;
use crate::testimonial::Testimonial;
use crate::typedid::RecordId;

const TEAM_IMAGES: [&str; 2] = [
    "https://i.imgur.com/eKGLi9U.jpeg",
    "https://i.imgur.com/oILzGmK.jpeg",
];

/// Fills empty tables with the content the landing page shipped with.
/// Tables that already hold rows are left alone.
#[tracing::instrument(skip(db))]
pub async fn seed_defaults(db: &dyn Database) -> Result<(), Error> {
    if repository::list(db.team_members()).await?.is_empty() {
        let members = TEAM_IMAGES
            .iter()
            .map(|image_url| TeamMember {
                id: RecordId::draft(),
                image_url: image_url.to_string(),
            })
            .collect();

        let report = repository::reconcile(db.team_members(), members).await?;
        info!(inserted = report.inserted.len(), "seeded team members");
    }

    if repository::list(db.testimonials()).await?.is_empty() {
        let report = repository::reconcile(db.testimonials(), default_testimonials()).await?;
        info!(inserted = report.inserted.len(), "seeded testimonials");
    }

    Ok(())
}

fn default_testimonials() -> Vec<Testimonial> {
    vec![
        Testimonial {
            id: RecordId::draft(),
            quote: "No dia que aceitei integrar meu estabelecimento ao Mais Delivery, vi resultados imediatos. Agora estamos oferecendo nossos produtos para um público muito maior, sem precisar de investimento.".to_string(),
            author: "José Pereira".to_string(),
            business: "JP LANCHES".to_string(),
            location: "Ibotirama/BA".to_string(),
            logo_url: "/lovable-uploads/f77b271e-548c-4262-acd1-cc6a29a145d8.png".to_string(),
        },
        Testimonial {
            id: RecordId::draft(),
            quote: "A parceria com o Mais Delivery transformou nossa visibilidade no mercado. O aumento nas vendas foi notável já nos primeiros meses, e a taxa justa torna o serviço extremamente vantajoso.".to_string(),
            author: "Jairo Chagas".to_string(),
            business: "JC IMPORTS".to_string(),
            location: "Ibotirama/BA".to_string(),
            logo_url: "/lovable-uploads/fd760325-58a6-411e-a047-98f63307db41.png".to_string(),
        },
        Testimonial {
            id: RecordId::draft(),
            quote: "Nossa entrada no Mais Delivery foi uma decisão acertada. A plataforma é intuitiva e a equipe de suporte realmente se importa com nosso sucesso. Recomendamos o serviço.".to_string(),
            author: "Eriques Fonseca".to_string(),
            business: "Lanchonete Pinguim".to_string(),
            location: "Barra/BA".to_string(),
            logo_url: "/lovable-uploads/c301d3fe-5693-4938-b64e-be25b2d44acf.png".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryDatabase;
    use crate::database::EntityStore;
    use crate::entity::Entity;

    #[tokio::test]
    async fn empty_tables_get_the_defaults() {
        let db = MemoryDatabase::new();

        seed_defaults(&db).await.unwrap();

        let team = db.team_members.fetch_all().await.unwrap();
        let images: Vec<_> = team.iter().map(|m| m.image_url.as_str()).collect();
        assert_eq!(images, TEAM_IMAGES.to_vec());
        let testimonials = db.testimonials.fetch_all().await.unwrap();
        assert_eq!(testimonials.len(), 3);
        assert_eq!(testimonials[2].author, "Eriques Fonseca");
    }

    #[test]
    fn defaults_pass_validation() {
        assert!(default_testimonials().iter().all(|t| t.validate().is_ok()));
    }

    #[tokio::test]
    async fn existing_content_is_kept() {
        let db = MemoryDatabase::new();
        seed_defaults(&db).await.unwrap();
        let before = db.write_counts();

        seed_defaults(&db).await.unwrap();

        assert_eq!(db.write_counts(), before);
        assert_eq!(db.team_members.fetch_all().await.unwrap().len(), 2);
    }
}
