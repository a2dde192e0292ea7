//! HTTP handlers and route configuration.

mod health;
mod posts;

use actix_web::web;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health_check))
        .service(
            web::scope("/admin/posts")
                .service(
                    web::resource("")
                        .route(web::get().to(posts::index))
                        .route(web::post().to(posts::store)),
                )
                // Literal segments before `{id}`
                .service(web::resource("/mine").route(web::get().to(posts::mine)))
                .service(web::resource("/create").route(web::get().to(posts::create)))
                .service(
                    web::resource("/{id}")
                        .route(web::get().to(posts::show))
                        .route(web::put().to(posts::update))
                        .route(web::patch().to(posts::update))
                        .route(web::delete().to(posts::destroy))
                        .route(web::post().to(posts::method_override)),
                )
                .service(web::resource("/{id}/edit").route(web::get().to(posts::edit))),
        );
}
