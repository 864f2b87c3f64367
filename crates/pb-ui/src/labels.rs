use pb_core::Language;

/// Static UI strings for one language.
#[derive(Debug)]
pub struct Labels {
    pub search: &'static str,
    pub upload: &'static str,
    pub login: &'static str,
    pub logout: &'static str,
    pub email: &'static str,
    pub password: &'static str,
    pub categories: &'static str,
    pub trending: &'static str,
    pub quick_saved: &'static str,
    pub quick_liked: &'static str,
    pub quick_recent: &'static str,
    pub clear: &'static str,
    pub empty: &'static str,
    pub like: &'static str,
    pub save: &'static str,
    pub saved: &'static str,
    pub share: &'static str,
    pub download: &'static str,
    pub link_copied: &'static str,
    pub comments: &'static str,
    pub no_comments: &'static str,
    pub add_comment: &'static str,
    pub send: &'static str,
    pub new_pin: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub tags: &'static str,
    pub image_url: &'static str,
    pub image_file: &'static str,
    pub autofill: &'static str,
    pub analyzing: &'static str,
    pub publish: &'static str,
    pub uploading: &'static str,
    pub close: &'static str,
    pub back: &'static str,
    pub by: &'static str,
    pub error_title: &'static str,
    pub reload: &'static str,
    pub demo_badge: &'static str,
}

static ES: Labels = Labels {
    search: "Buscar ideas, etiquetas, autores...",
    upload: "Crear",
    login: "Iniciar sesión",
    logout: "Cerrar sesión",
    email: "Correo",
    password: "Contraseña",
    categories: "Categorías",
    trending: "Tendencias",
    quick_saved: "Guardados",
    quick_liked: "Me gusta",
    quick_recent: "Recientes",
    clear: "Limpiar filtros",
    empty: "No hay pines que coincidan",
    like: "Me gusta",
    save: "Guardar",
    saved: "Guardado",
    share: "Compartir",
    download: "Descargar",
    link_copied: "Enlace copiado",
    comments: "Comentarios",
    no_comments: "Sé el primero en comentar",
    add_comment: "Añade un comentario",
    send: "Enviar",
    new_pin: "Nuevo pin",
    title: "Título",
    description: "Descripción",
    category: "Categoría",
    tags: "Etiquetas (separadas por comas)",
    image_url: "URL de la imagen",
    image_file: "o sube un archivo",
    autofill: "Autocompletar con IA",
    analyzing: "Analizando...",
    publish: "Publicar",
    uploading: "Publicando...",
    close: "Cerrar",
    back: "Volver",
    by: "por",
    error_title: "Algo salió mal",
    reload: "Recargar",
    demo_badge: "Modo demo",
};

static EN: Labels = Labels {
    search: "Search ideas, tags, authors...",
    upload: "Create",
    login: "Log in",
    logout: "Log out",
    email: "Email",
    password: "Password",
    categories: "Categories",
    trending: "Trending",
    quick_saved: "Saved",
    quick_liked: "Liked",
    quick_recent: "Recent",
    clear: "Clear filters",
    empty: "No pins match",
    like: "Like",
    save: "Save",
    saved: "Saved",
    share: "Share",
    download: "Download",
    link_copied: "Link copied",
    comments: "Comments",
    no_comments: "Be the first to comment",
    add_comment: "Add a comment",
    send: "Send",
    new_pin: "New pin",
    title: "Title",
    description: "Description",
    category: "Category",
    tags: "Tags (comma separated)",
    image_url: "Image URL",
    image_file: "or upload a file",
    autofill: "Autofill with AI",
    analyzing: "Analyzing...",
    publish: "Publish",
    uploading: "Publishing...",
    close: "Close",
    back: "Back",
    by: "by",
    error_title: "Something went wrong",
    reload: "Reload",
    demo_badge: "Demo mode",
};

pub fn labels(lang: Language) -> &'static Labels {
    match lang {
        Language::Es => &ES,
        Language::En => &EN,
    }
}
