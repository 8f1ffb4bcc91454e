mod feed_routes;
mod health;
mod helpers;
