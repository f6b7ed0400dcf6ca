use anyhow::Context;
use chrono::{Duration, Utc};
use database::schema::cms::{Article, Author};

use crate::store::{Session, Store};

const AUTHORS: [(&str, &str); 4] = [
    ("Marie Dubois", "Journaliste tech passionnée"),
    ("Jean Martin", "Développeur full-stack"),
    ("Sophie Laurent", "Designer UX/UI"),
    ("Pierre Durand", "Chef de projet digital"),
];

struct DemoArticle {
    title: &'static str,
    content: &'static str,
    author: usize,
}

const ARTICLES: [DemoArticle; 6] = [
    DemoArticle {
        title: "Introduction au Design Glassmorphique",
        content: "Le glassmorphisme est une tendance design qui simule l'effet du verre dépoli. Cette approche crée des interfaces modernes et élégantes.\n\nCaractéristiques principales :\n- Transparence et flou d'arrière-plan\n- Bordures subtiles\n- Ombres douces\n- Hiérarchie visuelle claire\n\nCette technique améliore l'expérience utilisateur tout en conservant une esthétique moderne.",
        author: 0,
    },
    DemoArticle {
        title: "Symfony 6 : Les Nouveautés",
        content: "Symfony 6 apporte de nombreuses améliorations pour les développeurs.\n\nPrincipales nouveautés :\n- PHP 8.1 minimum requis\n- AssetMapper pour la gestion des assets\n- Améliorations des performances\n- Nouvelle syntaxe pour les attributs\n\nCes évolutions rendent le développement plus efficace et moderne.",
        author: 1,
    },
    DemoArticle {
        title: "UX Design : Principes Fondamentaux",
        content: "L'expérience utilisateur (UX) est cruciale pour le succès d'une application.\n\nPrincipes clés :\n- Simplicité et clarté\n- Consistance dans l'interface\n- Feedback utilisateur\n- Accessibilité pour tous\n- Tests utilisateurs réguliers\n\nUn bon UX design augmente la satisfaction et l'engagement des utilisateurs.",
        author: 2,
    },
    DemoArticle {
        title: "Gestion de Projet Agile",
        content: "La méthodologie Agile transforme la gestion de projet informatique.\n\nAvantages de l'Agile :\n- Flexibilité et adaptabilité\n- Livraisons fréquentes\n- Collaboration étroite\n- Amélioration continue\n- Réduction des risques\n\nCette approche favorise l'innovation et la réactivité aux changements.",
        author: 3,
    },
    DemoArticle {
        title: "Bootstrap 5 : Guide Complet",
        content: "Bootstrap 5 simplifie le développement d'interfaces responsives.\n\nNouvelles fonctionnalités :\n- Suppression de jQuery\n- Nouvelles classes utilitaires\n- Système de grille amélioré\n- Composants modernisés\n- Meilleure personnalisation\n\nUn framework incontournable pour le développement web moderne.",
        author: 1,
    },
    DemoArticle {
        title: "Accessibilité Web : Bonnes Pratiques",
        content: "L'accessibilité web garantit l'usage pour tous les utilisateurs.\n\nRègles WCAG essentielles :\n- Contrastes suffisants\n- Navigation au clavier\n- Textes alternatifs\n- Structure sémantique\n- Tailles de police adaptées\n\nUne approche inclusive bénéficie à tous les utilisateurs.",
        author: 2,
    },
];

/// Seeds the demo authors and articles in a single session. Unless `append`
/// is set, every existing article and author is removed first.
pub async fn load(store: &dyn Store, append: bool) -> anyhow::Result<()> {
    let mut session = store.begin().await?;
    seed(session.as_mut(), append).await?;
    session.commit().await?;
    info!(
        "loaded {} demo authors and {} demo articles",
        AUTHORS.len(),
        ARTICLES.len()
    );

    Ok(())
}

/// Writes the demo data into `session` without committing it. Authors that
/// already exist are reused by name.
///
/// Article `n` is published `n + 1` days ago, so the first one is the newest.
pub async fn seed(session: &mut dyn Session, append: bool) -> anyhow::Result<()> {
    let now = Utc::now();
    if !append {
        session.purge().await?;
    }

    let mut authors = Vec::with_capacity(AUTHORS.len());
    for (name, description) in AUTHORS {
        let author = match session.find_author_by_name(name).await? {
            Some(author) => author,
            None => {
                let mut author = Author::new(name, Some(description.to_owned()));
                session.save_author(&mut author).await?;
                author
            }
        };
        authors.push(author);
    }

    for (index, demo) in ARTICLES.iter().enumerate() {
        let author = authors
            .get(demo.author)
            .with_context(|| format!("demo article {} has no author", index))?;
        let mut article = Article::new(demo.title.to_owned(), demo.content.to_owned(), author.id);
        article.published_at = now - Duration::days(index as i64 + 1);
        session.save_article(&mut article).await?;
    }

    Ok(())
}
